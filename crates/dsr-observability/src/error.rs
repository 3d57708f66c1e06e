/// Errors raised while installing observability.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// The level is not a valid filter directive.
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    /// A global subscriber was installed earlier.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}
