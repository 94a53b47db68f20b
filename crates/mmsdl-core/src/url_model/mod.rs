//! Output filename derivation.
//!
//! Derives a safe local filename from the stream URL and, unless the caller
//! wants to overwrite or resume, steps around files that already exist.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

use std::path::{Path, PathBuf};

/// Filename when the URL yields nothing usable.
pub const DEFAULT_FILENAME: &str = "mmsdl.wmv";

/// Extension assumed for MMS streams whose name carries none.
const DEFAULT_EXTENSION: &str = ".wmv";

/// Derives a safe filename for saving `url`.
///
/// - `derive_filename("mms://host/media/show.asf")` → `"show.asf"`
/// - `derive_filename("mms://host/live/channel1")` → `"channel1.wmv"`
/// - `derive_filename("mms://host/")` → `"mmsdl.wmv"`
pub fn derive_filename(url: &str) -> String {
    let sanitized = filename_from_url_path(url)
        .map(|raw| sanitize_filename_for_linux(&raw))
        .unwrap_or_default();
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return DEFAULT_FILENAME.to_string();
    }
    if sanitized.contains('.') {
        sanitized
    } else {
        sanitized + DEFAULT_EXTENSION
    }
}

/// First of `base`, `base.1`, `base.2`, ... that does not exist.
pub fn first_free_path(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let mut i: u64 = 1;
    loop {
        let mut candidate = base.as_os_str().to_os_string();
        candidate.push(format!(".{i}"));
        let candidate = PathBuf::from(candidate);
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}

/// Picks the output path: `explicit` if given, else derived from `url`.
/// With `reuse_existing` (clobber or resume) the name is used as-is.
pub fn choose_output_path(explicit: Option<&Path>, url: &str, reuse_existing: bool) -> PathBuf {
    let base = match explicit {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(derive_filename(url)),
    };
    if reuse_existing {
        base
    } else {
        first_free_path(&base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_filename_keeps_extension() {
        assert_eq!(derive_filename("mms://media.example.com/news/clip.asf"), "clip.asf");
        assert_eq!(derive_filename("mmsh://host:8080/a/b/show.wmv"), "show.wmv");
    }

    #[test]
    fn derive_filename_appends_wmv() {
        assert_eq!(derive_filename("mms://host/live/channel1"), "channel1.wmv");
        assert_eq!(derive_filename("/captures/raw"), "raw.wmv");
    }

    #[test]
    fn derive_filename_fallback() {
        assert_eq!(derive_filename("mms://host/"), DEFAULT_FILENAME);
        assert_eq!(derive_filename("mms://host"), DEFAULT_FILENAME);
        assert_eq!(derive_filename("mms://host/.."), DEFAULT_FILENAME);
    }

    #[test]
    fn first_free_path_counts_up() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("show.wmv");
        assert_eq!(first_free_path(&base), base);

        std::fs::write(&base, b"x").unwrap();
        assert_eq!(first_free_path(&base), dir.path().join("show.wmv.1"));

        std::fs::write(dir.path().join("show.wmv.1"), b"x").unwrap();
        assert_eq!(first_free_path(&base), dir.path().join("show.wmv.2"));
    }

    #[test]
    fn reuse_existing_keeps_the_name() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("show.wmv");
        std::fs::write(&base, b"partial").unwrap();
        assert_eq!(choose_output_path(Some(&base), "mms://h/x", true), base);
        assert_eq!(
            choose_output_path(Some(&base), "mms://h/x", false),
            dir.path().join("show.wmv.1")
        );
    }
}
