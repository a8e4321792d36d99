use cuebot_core::ConfigError;
use cuebot_robot::DispatchError;

/// Errors produced by the facade helpers and the CLI.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
