use thiserror::Error;

/// Errors detected while validating a restraint definition against the system
/// it is attached to.
///
/// All variants are raised synchronously by the configuration paths; the
/// evaluation path never fails on validly configured state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("number of reference positions ({actual}) does not equal number of particles in the system ({expected})")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("illegal particle index for RMSD: {index} (system has {system_size} particles)")]
    InvalidIndex { index: usize, system_size: usize },

    #[error("duplicated particle index for RMSD: {index}")]
    DuplicateIndex { index: usize },
}
