//! clipocr - clipboard OCR tool
//!
//! Reads an image from the system clipboard, recognizes its text via the
//! Baidu OCR API, and writes the recognized text back to the clipboard.

pub mod app;
pub mod clipboard;
pub mod data;
pub mod error;
pub mod ocr;

pub use data::{AppConfig, BaiduTokenFetcher, TokenCache, TokenFetcher};
pub use error::{Error, ImageRejection, Result};
pub use ocr::OcrClient;
