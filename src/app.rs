//! Run flow
//!
//! Clipboard image -> cached token -> recognition -> clipboard text.
//! The clipboard is read before any network traffic so an empty clipboard
//! fails fast and leaves everything untouched.

use tracing::{info, warn};

use crate::clipboard;
use crate::data::{token_cache, AppConfig, BaiduTokenFetcher, TokenCache};
use crate::error::{Error, Result};
use crate::ocr::OcrClient;

pub async fn run(config: AppConfig) -> Result<()> {
    let image = clipboard::read_image()?;
    info!("Clipboard image: {}x{}", image.width(), image.height());

    let fetcher = BaiduTokenFetcher::new(&config)?;
    let cache = TokenCache::new(token_cache::default_state_path(), fetcher);
    let token = cache.get_token().await?;

    let ocr = OcrClient::new(config.timeout_secs)?;
    let text = match ocr.recognize(&image, &token).await {
        Ok(text) => text,
        // A stale cached token can outlive its recorded expiry on the
        // server side. Refresh and retry exactly once.
        Err(Error::TokenRejected(code)) => {
            warn!(
                "Recognition rejected the access token (error_code {}), refreshing",
                code
            );
            let token = cache.force_refresh().await?;
            ocr.recognize(&image, &token).await?
        }
        Err(e) => return Err(e),
    };

    info!("Recognized {} character(s)", text.chars().count());
    clipboard::write_text(&text)?;
    info!("Recognized text copied to clipboard");
    Ok(())
}
