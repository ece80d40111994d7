use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to create uinput device: {0}")]
    DeviceCreation(#[from] std::io::Error),

    #[error(transparent)]
    Movement(#[from] windmouse::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
