use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::error::FeedError;
use crate::http::HttpClient;

use super::parse::{Feed, parse_feed};

/// Fetch raw feed bytes from a URL (without parsing)
pub async fn fetch_feed_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Bytes, FeedError> {
    let fetch_failed = |source| FeedError::FetchFailed {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).await.map_err(fetch_failed)?;
    if !response.is_success() {
        return Err(FeedError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }
    response.collect().await.map_err(fetch_failed)
}

/// Read raw feed bytes from a local file (without parsing)
pub fn read_feed_file(path: &Path) -> Result<Vec<u8>, FeedError> {
    std::fs::read(path).map_err(|e| FeedError::FileReadFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Fetch and parse a feed from a URL or a local file path
pub async fn fetch_feed<C: HttpClient + ?Sized>(
    client: &C,
    source: &str,
) -> Result<Feed, FeedError> {
    let feed = if is_url(source) {
        let bytes = fetch_feed_bytes(client, source).await?;
        parse_feed(&bytes)?
    } else {
        let bytes = read_feed_file(Path::new(source))?;
        parse_feed(&bytes)?
    };

    debug!(source, entries = feed.entries.len(), "fetched feed");
    Ok(feed)
}

/// Determine if a string is a URL or a file path
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
