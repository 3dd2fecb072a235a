//! Errors reported by maps, views and cursors.

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by [`BlockMap`](crate::gb::BlockMap) and its views and cursors.
///
/// A lookup miss is never an error, it is reported as `None`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Key lies outside the bounds of a range view.
    #[error("key out of range for view")]
    OutOfRange,

    /// The map was modified after the cursor was created, other than through the cursor.
    #[error("map modified during iteration")]
    ConcurrentModification,

    /// Cursor has no further elements.
    #[error("no such element")]
    NoSuchElement,

    /// Operation not valid in the current cursor state.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// Range low bound is above its high bound.
    #[error("range start is greater than range end")]
    InvalidOrdering,
}
