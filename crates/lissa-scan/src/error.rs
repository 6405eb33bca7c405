//! Error types for lissa-scan.
//!
//! Invalid input is rejected at the boundary, before any sample is generated.
//! An optimizer search that finds nothing is *not* an error: see
//! [`crate::optimizer::BestParameters::NoFeasibleCandidate`].

/// Result type alias
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors raised while validating scan inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    /// A numeric input is out of its valid domain (zero frequency, zero
    /// resolution, non-finite phase, empty range, ...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The two drive frequencies cannot produce a meaningful 2-D scan.
    #[error("Degenerate frequency pair: fx={fx}, fy={fy}")]
    DegenerateFrequencyPair {
        /// Fast-axis frequency (Hz)
        fx: u32,
        /// Slow-axis frequency (Hz)
        fy: u32,
    },
}

impl ScanError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ScanError::InvalidParameter(msg.into())
    }
}

/// Reject a zero value for a field that must be a positive integer.
pub(crate) fn require_positive<T>(name: &str, value: T) -> Result<()>
where
    T: PartialEq + Default + std::fmt::Display,
{
    if value == T::default() {
        return Err(ScanError::invalid(format!("{name} must be >= 1, got {value}")));
    }
    Ok(())
}

/// Reject NaN and infinities.
pub(crate) fn require_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ScanError::invalid(format!("{name} must be finite, got {value}")));
    }
    Ok(())
}
