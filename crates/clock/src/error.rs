use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("Invalid Argument: {0}")]
    InvalidArgument(String),
}
