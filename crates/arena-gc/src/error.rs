//! Error types for heap operations.

use thiserror::Error;

use crate::arena::ArenaId;
use crate::handles::Handle;

/// Errors returned by allocation, collection and verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GcError {
    /// No free block in the target arena is large enough.
    ///
    /// Recoverable: the arena and handle table are unchanged.
    #[error("out of memory in {arena}: no free block holds {requested} bytes")]
    OutOfMemory {
        /// Arena the request was made against.
        arena: ArenaId,
        /// Requested payload size after alignment.
        requested: usize,
    },

    /// Every handle slot is in use.
    ///
    /// Recoverable: checked before the arena is touched.
    #[error("handle table full ({capacity} slots)")]
    HandleTableFull {
        /// Slot capacity of the table.
        capacity: usize,
    },

    /// A minor collection could not find room in the old generation for a
    /// promoted object.
    ///
    /// Fatal: the collection stopped midway and the heap is left in an
    /// unspecified state. The host should drop the heap or abort.
    #[error("promotion of {handle} ({size} bytes) failed: old generation exhausted")]
    PromotionFailed {
        /// Handle of the object being promoted.
        handle: Handle,
        /// Payload size of the object.
        size: usize,
    },

    /// Rejected heap configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// A structural invariant does not hold.
    #[error("{arena} corrupted at offset {offset}: {reason}")]
    Corrupted {
        /// Arena in which the violation was found.
        arena: ArenaId,
        /// Offset of the offending block or position.
        offset: usize,
        /// What was violated.
        reason: String,
    },
}

impl GcError {
    /// Whether this error leaves the heap without a defined recovery.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::PromotionFailed { .. })
    }
}

/// Result type for heap operations.
pub type Result<T> = std::result::Result<T, GcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_promotion_failure_is_fatal() {
        let fatal = GcError::PromotionFailed {
            handle: Handle::from_index(3),
            size: 64,
        };
        assert!(fatal.is_fatal());

        let recoverable = [
            GcError::OutOfMemory {
                arena: ArenaId::YoungA,
                requested: 8,
            },
            GcError::HandleTableFull { capacity: 128 },
            GcError::InvalidConfig("capacity"),
        ];
        assert!(recoverable.iter().all(|e| !e.is_fatal()));
    }

    #[test]
    fn test_messages() {
        let err = GcError::OutOfMemory {
            arena: ArenaId::Old,
            requested: 40,
        };
        assert_eq!(
            err.to_string(),
            "out of memory in old: no free block holds 40 bytes"
        );
        let err = GcError::PromotionFailed {
            handle: Handle::from_index(5),
            size: 16,
        };
        assert_eq!(
            err.to_string(),
            "promotion of handle#5 (16 bytes) failed: old generation exhausted"
        );
    }
}
