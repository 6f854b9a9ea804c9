pub mod config;
pub mod crop;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod render;
pub mod scene;
pub mod selection;
pub mod session;
pub mod stage;
pub mod state;
pub mod text;
pub mod upload;

pub use error::{AppError, AppResult};
pub use session::EditorSession;
