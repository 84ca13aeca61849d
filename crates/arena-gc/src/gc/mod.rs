//! Stop-the-world collectors.
//!
//! - [`minor`]: copying collection between the young semispaces, with
//!   promotion into the old generation.
//! - [`major`]: in-place sliding compaction of the old generation.
//!
//! Neither collector traces references. An object is live exactly when its
//! handle slot is occupied (minor) or its block is not free (major).

pub mod major;
pub mod minor;
