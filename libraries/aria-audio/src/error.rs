/// Audio error types
use thiserror::Error;

/// Result type for audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Equalizer and filter-stage errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Band index outside the fixed band set
    #[error("Band index {index} out of range (band count: {count})")]
    BandOutOfRange {
        /// Requested band
        index: usize,
        /// Number of bands
        count: usize,
    },

    /// Gain list does not match the band count
    #[error("Expected {expected} gains, got {actual}")]
    GainCountMismatch {
        /// Number of bands
        expected: usize,
        /// Number of gains supplied
        actual: usize,
    },

    /// Gain is NaN or infinite
    #[error("Gain must be finite, got {0}")]
    NonFiniteGain(f32),

    /// Q factor is NaN or infinite
    #[error("Q must be finite, got {0}")]
    NonFiniteQ(f32),

    /// A newer rebuild was started before this stage was attached
    #[error("Filter stage generation {stage} superseded by generation {latest}")]
    StaleStage {
        /// Generation of the rejected stage
        stage: u64,
        /// Latest generation handed out
        latest: u64,
    },
}
