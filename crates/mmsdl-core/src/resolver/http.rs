//! Playlist fetched over HTTP (`.asx` links on web pages).

use anyhow::{Context, Result};
use std::time::Duration;

use super::{extract_mms_url, ResolvedStream, Resolver};

/// Playlists are small; anything bigger is not one.
pub const MAX_PLAYLIST_BYTES: usize = 1024 * 1024;

/// Fetches an `http(s)://` playlist with curl and extracts the stream URL.
///
/// Blocking; call from `spawn_blocking` if used from async code.
#[derive(Debug, Clone)]
pub struct HttpPlaylistResolver {
    url: String,
}

impl HttpPlaylistResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Resolver for HttpPlaylistResolver {
    fn resolve(&self) -> Result<ResolvedStream> {
        let body = fetch_playlist(&self.url)?;
        let text = String::from_utf8_lossy(&body);
        let url = extract_mms_url(&text)
            .with_context(|| format!("no mms:// URL found in playlist {}", self.url))?;
        tracing::info!(playlist = %self.url, %url, "resolved playlist");
        Ok(ResolvedStream { url })
    }
}

fn fetch_playlist(url: &str) -> Result<Vec<u8>> {
    let mut body: Vec<u8> = Vec::new();
    let mut truncated = false;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(30))?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            let room = MAX_PLAYLIST_BYTES.saturating_sub(body.len());
            if data.len() > room {
                body.extend_from_slice(&data[..room]);
                truncated = true;
                // Short count aborts the transfer.
                return Ok(room);
            }
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()
    };
    if let Err(e) = performed {
        if !(truncated && e.is_write_error()) {
            return Err(e).context("playlist request failed");
        }
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("GET {} returned HTTP {}", url, code);
    }
    if truncated {
        tracing::warn!(url, "playlist larger than {} bytes, truncated", MAX_PLAYLIST_BYTES);
    }
    Ok(body)
}
