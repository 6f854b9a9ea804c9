use crate::config::ConfigError;
use crate::crop::CropError;
use crate::render::RenderError;
use crate::state::StateError;
use crate::upload::UploadError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
