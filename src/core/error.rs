#[cfg(not(feature = "std"))]
use alloc::string::String;

use thiserror::Error;

/// Errors raised while preparing a simulation.
///
/// Everything here is detected before the first update is applied; a run that
/// has started never fails. Hitting the iteration cap is reported through
/// [`crate::simulation::Termination`], not as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PcsError {
    /// A vector or matrix row does not match the network dimension.
    #[error("dimension mismatch: {what} has length {actual}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The configuration was rejected by [`crate::simulation::PcsConfig::validate`].
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// An explicitly empty list of convergence criteria.
    #[error("at least one convergence criterion is required")]
    NoCriteria,

    /// Two criteria were registered under the same name.
    #[error("duplicate convergence criterion name `{0}`")]
    DuplicateCriterion(String),
}

pub type PcsResult<T> = Result<T, PcsError>;

/// Fail with [`PcsError::DimensionMismatch`] unless `actual == expected`.
pub(crate) fn expect_len(what: &'static str, expected: usize, actual: usize) -> PcsResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(PcsError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}
