//! Error types for clipocr.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Reason an image was rejected before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRejection {
    /// Width or height below the 15 px service minimum.
    TooSmall { width: u32, height: u32 },
    /// Width or height above the 4096 px service maximum.
    TooLarge { width: u32, height: u32 },
    /// Base64-encoded payload exceeds the 15 MiB service limit.
    OverSizeLimit { encoded_len: usize },
}

impl std::fmt::Display for ImageRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooSmall { width, height } => {
                write!(f, "{}x{} is below the 15x15 px minimum", width, height)
            }
            Self::TooLarge { width, height } => {
                write!(f, "{}x{} exceeds the 4096x4096 px maximum", width, height)
            }
            Self::OverSizeLimit { encoded_len } => {
                write!(f, "encoded size {} bytes exceeds the 15 MiB limit", encoded_len)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "config file not found at {0}, please create it with app_id, api_key and sec_key entries"
    )]
    ConfigNotFound(PathBuf),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("token request failed: {0}")]
    TokenFetch(String),

    #[error("image rejected: {0}")]
    InvalidImage(ImageRejection),

    #[error("access token rejected by the recognition service (error_code {0})")]
    TokenRejected(i64),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("clipboard does not contain an image")]
    NoClipboardImage,

    #[error("clipboard error: {0}")]
    Clipboard(#[from] arboard::Error),

    #[error("failed to encode image: {0}")]
    ImageEncode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to serialize state: {0}")]
    State(#[from] serde_json::Error),
}
