//! Error types for world operations

use std::fmt;

use crate::body::BodyKey;

/// Failure of a per-body world operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// The key refers to a body that was removed
    StaleBody(BodyKey),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::StaleBody(key) => write!(f, "Body {:?} no longer exists", key),
        }
    }
}

impl std::error::Error for PhysicsError {}
