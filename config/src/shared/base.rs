use thiserror::Error;

/// Errors raised when a loaded configuration is internally inconsistent.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A field holds a value outside of its allowed range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// A termination marker is empty or only whitespace.
    #[error("`driver.termination_markers` must not contain blank markers")]
    BlankTerminationMarker,
}
