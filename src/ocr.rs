//! OCR client
//!
//! Validates and encodes a clipboard image, submits it to the Baidu
//! accurate-basic recognition endpoint, and flattens the `words_result`
//! array into one newline-joined text blob.

use std::io::Cursor;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, ImageRejection, Result};

pub const OCR_URL: &str = "https://aip.baidubce.com/rest/2.0/ocr/v1/accurate_basic";

/// Service-imposed image constraints.
const MIN_DIMENSION: u32 = 15;
const MAX_DIMENSION: u32 = 4096;
const MAX_ENCODED_BYTES: usize = 15 * 1024 * 1024;

const JPEG_QUALITY: u8 = 75;

// Baidu error codes for an unusable bearer token.
const ERR_INVALID_TOKEN: i64 = 110;
const ERR_EXPIRED_TOKEN: i64 = 111;

/// One recognized text fragment.
#[derive(Debug, Clone, Deserialize)]
pub struct WordsResult {
    pub words: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    words_result: Option<Vec<WordsResult>>,
    error_code: Option<i64>,
    error_msg: Option<String>,
}

/// Serialize the image as quality-75 JPEG, then standard base64.
pub fn encode_image(image: &RgbaImage) -> Result<String> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
    Ok(STANDARD.encode(&jpeg))
}

/// Encode the image if it satisfies the service constraints, otherwise
/// report which constraint it violates.
pub fn validate_and_encode(image: &RgbaImage) -> Result<String> {
    let (width, height) = image.dimensions();
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(Error::InvalidImage(ImageRejection::TooSmall { width, height }));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::InvalidImage(ImageRejection::TooLarge { width, height }));
    }
    let encoded = encode_image(image)?;
    if encoded.len() > MAX_ENCODED_BYTES {
        return Err(Error::InvalidImage(ImageRejection::OverSizeLimit {
            encoded_len: encoded.len(),
        }));
    }
    Ok(encoded)
}

/// Join recognized fragments in response order, one per line.
pub fn extract_text(words_result: &[WordsResult]) -> String {
    words_result
        .iter()
        .map(|w| w.words.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Client for the recognition endpoint.
pub struct OcrClient {
    http: reqwest::Client,
    base_url: String,
}

impl OcrClient {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: OCR_URL.to_string(),
        })
    }

    /// Override the recognition endpoint, e.g. to point at a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Recognize text in the image using the given access token.
    ///
    /// An invalid or expired token surfaces as [`Error::TokenRejected`] so
    /// the caller can refresh the token and retry once.
    pub async fn recognize(&self, image: &RgbaImage, access_token: &str) -> Result<String> {
        let encoded = validate_and_encode(image)?;
        debug!(
            "Submitting {}x{} image ({} base64 bytes) for recognition",
            image.width(),
            image.height(),
            encoded.len()
        );

        let params = [
            ("image", encoded.as_str()),
            ("access_token", access_token),
            ("language_type", "auto_detect"),
            ("detect_direction", "true"),
        ];
        let resp = self.http.post(&self.base_url).form(&params).send().await?;
        let body: OcrResponse = resp.json().await?;

        if let Some(words_result) = body.words_result {
            debug!("Recognition returned {} fragment(s)", words_result.len());
            return Ok(extract_text(&words_result));
        }
        match body.error_code {
            Some(code @ (ERR_INVALID_TOKEN | ERR_EXPIRED_TOKEN)) => Err(Error::TokenRejected(code)),
            Some(code) => Err(Error::Recognition(format!(
                "error_code {}: {}",
                code,
                body.error_msg.unwrap_or_default()
            ))),
            None => Err(Error::Recognition(
                "response missing words_result".to_string(),
            )),
        }
    }
}
