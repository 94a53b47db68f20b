//! Pulling an MMS URL out of a playlist (ASX, plain text, HTML).

use crate::stream::MMS_SCHEMES;

/// First `mms://`, `mmst://` or `mmsh://` URL in `text`.
///
/// The scheme match is case-insensitive. The URL ends at whitespace, a quote
/// or an angle bracket; `&amp;` is decoded since ASX files are XML.
pub fn extract_mms_url(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let start = MMS_SCHEMES
        .iter()
        .filter_map(|scheme| lower.find(&format!("{scheme}://")))
        .min()?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>'))
        .unwrap_or(rest.len());
    let url = rest[..end].replace("&amp;", "&");
    Some(url)
}
