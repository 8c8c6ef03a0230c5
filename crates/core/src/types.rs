//! Identifier types for txinflow
//!
//! This module defines the foundational identifiers:
//! - Xid: Global transaction identifier correlating inflowed branches
//! - ActivityId: Local identifier of a durable activity record

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Global transaction identifier in the X/Open XA layout
///
/// Two Xids denote the same global transaction branch when format id,
/// global transaction id and branch qualifier are all equal; `Eq` and
/// `Hash` cover exactly those three parts, so an `Xid` can key the
/// import registry directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xid {
    format_id: i32,
    global_transaction_id: Vec<u8>,
    branch_qualifier: Vec<u8>,
}

impl Xid {
    /// Maximum length for global transaction ID.
    pub const MAXGTRIDSIZE: usize = 64;
    /// Maximum length for branch qualifier.
    pub const MAXBQUALSIZE: usize = 64;
    /// Format id reserved for the null Xid.
    pub const NULL_FORMAT_ID: i32 = -1;

    /// Create a new Xid
    ///
    /// # Errors
    /// Returns `InvalidArgument` if either byte part exceeds its maximum size.
    pub fn new(
        format_id: i32,
        global_transaction_id: &[u8],
        branch_qualifier: &[u8],
    ) -> Result<Self> {
        if global_transaction_id.len() > Self::MAXGTRIDSIZE {
            return Err(Error::invalid_argument(format!(
                "global transaction id is {} bytes, maximum is {}",
                global_transaction_id.len(),
                Self::MAXGTRIDSIZE
            )));
        }
        if branch_qualifier.len() > Self::MAXBQUALSIZE {
            return Err(Error::invalid_argument(format!(
                "branch qualifier is {} bytes, maximum is {}",
                branch_qualifier.len(),
                Self::MAXBQUALSIZE
            )));
        }

        Ok(Self {
            format_id,
            global_transaction_id: global_transaction_id.to_vec(),
            branch_qualifier: branch_qualifier.to_vec(),
        })
    }

    /// The null Xid. Rejected by every registry operation.
    pub fn null() -> Self {
        Self {
            format_id: Self::NULL_FORMAT_ID,
            global_transaction_id: Vec::new(),
            branch_qualifier: Vec::new(),
        }
    }

    /// Generate a random Xid (format id 0, UUID v4 global part)
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();
        Self {
            format_id: 0,
            global_transaction_id: uuid.as_bytes().to_vec(),
            branch_qualifier: vec![0u8; 8],
        }
    }

    /// True for the null Xid or one without a global transaction id
    pub fn is_null(&self) -> bool {
        self.format_id == Self::NULL_FORMAT_ID || self.global_transaction_id.is_empty()
    }

    /// Returns the format identifier.
    pub fn format_id(&self) -> i32 {
        self.format_id
    }

    /// Returns the global transaction identifier.
    pub fn global_transaction_id(&self) -> &[u8] {
        &self.global_transaction_id
    }

    /// Returns the branch qualifier.
    pub fn branch_qualifier(&self) -> &[u8] {
        &self.branch_qualifier
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.format_id)?;
        for b in &self.global_transaction_id {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ":")?;
        for b in &self.branch_qualifier {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Identifier of a durable activity record
///
/// Wraps a UUID v4. Every subordinate transaction owns one, and crash
/// recovery rebuilds a transaction from the record it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(Uuid);

impl ActivityId {
    /// Create a new random ActivityId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil activity id. Rejected by recovery.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Create an ActivityId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse an ActivityId from its string form
    ///
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// True for the nil id
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ActivityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
