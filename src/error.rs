//! Unified error type.

use thiserror::Error;

/// The error type returned by reqlog's fallible operations.
///
/// Request handling itself never fails: missing fields become sentinels and
/// unsupported response shapes only lose the completion line. This type
/// surfaces configuration problems caught while building [`Options`].
///
/// [`Options`]: crate::Options
#[derive(Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("{var}: expected a boolean, got `{value}`")]
    InvalidFlag { var: String, value: String },
}
