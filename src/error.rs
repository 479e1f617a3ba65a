//! Startup failures that abort the program

use std::path::PathBuf;

#[derive(Debug)]
pub enum AppError {
    /// Window creation or presenting a frame failed
    Window(String),
    /// A required texture could not be read or decoded
    Texture { path: PathBuf, source: image::ImageError },
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Window(e) => write!(f, "Window error: {}", e),
            AppError::Texture { path, source } => {
                write!(f, "Failed to load texture {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Window(_) => None,
            AppError::Texture { source, .. } => Some(source),
        }
    }
}

impl From<minifb::Error> for AppError {
    fn from(e: minifb::Error) -> Self {
        AppError::Window(e.to_string())
    }
}
