use thiserror::Error;

#[derive(Error, Debug)]
pub enum SketchError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("unknown sketch: {0}")]
    UnknownSketch(String),

    /// Dimensions, fps or duration out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("palette error: {0}")]
    Palette(String),

    #[error("usage: {0}")]
    Usage(String),
}

impl From<figment::Error> for SketchError {
    fn from(e: figment::Error) -> Self {
        SketchError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SketchError>;
