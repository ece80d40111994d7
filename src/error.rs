use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to move pointer by ({dx}, {dy}): {reason}")]
    MoveFailed { dx: i32, dy: i32, reason: String },

    #[error("input device error: {0}")]
    Device(#[from] std::io::Error),

    #[error("movement cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
