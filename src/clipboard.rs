//! Clipboard glue
//!
//! Thin wrapper around `arboard`: read one image in, write one text blob
//! out. Non-image clipboard content (text, files, nothing) maps to
//! [`Error::NoClipboardImage`].

use arboard::Clipboard;
use image::RgbaImage;
use tracing::debug;

use crate::error::{Error, Result};

/// Read the current clipboard image as RGBA pixels.
pub fn read_image() -> Result<RgbaImage> {
    let mut clipboard = Clipboard::new()?;
    let data = clipboard.get_image().map_err(|e| match e {
        arboard::Error::ContentNotAvailable => Error::NoClipboardImage,
        other => Error::Clipboard(other),
    })?;
    debug!("Clipboard holds a {}x{} image", data.width, data.height);

    RgbaImage::from_raw(
        data.width as u32,
        data.height as u32,
        data.bytes.into_owned(),
    )
    .ok_or(Error::Clipboard(arboard::Error::ConversionFailure))
}

/// Replace the clipboard contents with the given text.
pub fn write_text(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new()?;
    clipboard.set_text(text)?;
    Ok(())
}
