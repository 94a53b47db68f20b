//! Turning user input into a stream URL the downloader can open.
//!
//! The downloader only sees [`ResolvedStream`]; playlists and stdin input
//! are unwrapped here first.

mod extract;
mod http;

pub use extract::extract_mms_url;
pub use http::{HttpPlaylistResolver, MAX_PLAYLIST_BYTES};

use anyhow::{Context, Result};
use std::io::Read;

use crate::stream::url_scheme;

/// Input argument that means "read the URL or playlist from stdin".
pub const STDIN_ARG: &str = "-";

/// Direct stream URL (or local path) ready for a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub url: String,
}

/// Implemented by every input source.
pub trait Resolver {
    fn resolve(&self) -> Result<ResolvedStream>;
}

/// Input that already names a stream: mms URLs, `file://` URLs and paths.
#[derive(Debug, Clone)]
pub struct PassThrough {
    url: String,
}

impl PassThrough {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Resolver for PassThrough {
    fn resolve(&self) -> Result<ResolvedStream> {
        Ok(ResolvedStream {
            url: self.url.clone(),
        })
    }
}

/// Reads a playlist or a bare URL from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinResolver;

impl Resolver for StdinResolver {
    fn resolve(&self) -> Result<ResolvedStream> {
        let mut text = String::new();
        std::io::stdin()
            .lock()
            .take(MAX_PLAYLIST_BYTES as u64)
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        resolve_text(&text)
    }
}

/// An mms URL anywhere in `text`, else the first non-empty line.
pub fn resolve_text(text: &str) -> Result<ResolvedStream> {
    if let Some(url) = extract_mms_url(text) {
        return Ok(ResolvedStream { url });
    }
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .context("no stream URL in input")?;
    Ok(ResolvedStream {
        url: line.to_string(),
    })
}

/// Picks the resolver for a command-line input.
pub fn resolver_for(input: &str) -> Box<dyn Resolver> {
    if input == STDIN_ARG {
        return Box::new(StdinResolver);
    }
    match url_scheme(input) {
        Some(s) if s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https") => {
            Box::new(HttpPlaylistResolver::new(input))
        }
        _ => Box::new(PassThrough::new(input)),
    }
}
