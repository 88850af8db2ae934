//! Random name generation.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Length of storage object names.
pub const DEFAULT_NAME_LENGTH: usize = 21;

/// Length of names shown to the user (saved result files).
pub const SHORT_NAME_LENGTH: usize = 8;

/// Generate a random name drawn uniformly from `[A-Za-z0-9]`.
///
/// Collision resistance is probabilistic only: at the default length of 21
/// symbols there are 62^21 possible names.
pub fn generate_name(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
