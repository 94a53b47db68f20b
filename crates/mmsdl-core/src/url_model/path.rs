//! Filename hint from a stream URL or a plain path.

use std::path::Path;

use crate::stream::url_scheme;

/// Last path segment of `url`, or the file name of a plain path.
///
/// Returns `None` when there is nothing usable (root path, `.`/`..`).
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let segment = match url_scheme(url) {
        Some(_) => {
            let parsed = url::Url::parse(url).ok()?;
            parsed
                .path()
                .split('/')
                .filter(|s| !s.is_empty())
                .last()?
                .to_string()
        }
        None => Path::new(url).file_name()?.to_string_lossy().into_owned(),
    };
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mms_urls() {
        assert_eq!(
            filename_from_url_path("mms://host/a/b/file.wmv").as_deref(),
            Some("file.wmv")
        );
        assert_eq!(
            filename_from_url_path("mmst://host/single").as_deref(),
            Some("single")
        );
    }

    #[test]
    fn root_or_empty() {
        assert_eq!(filename_from_url_path("mms://host/"), None);
        assert_eq!(filename_from_url_path("mms://host"), None);
    }

    #[test]
    fn query_is_ignored() {
        assert_eq!(
            filename_from_url_path("mmsh://host/clip.asf?session=1").as_deref(),
            Some("clip.asf")
        );
    }

    #[test]
    fn plain_paths() {
        assert_eq!(
            filename_from_url_path("/var/tmp/capture.asf").as_deref(),
            Some("capture.asf")
        );
        assert_eq!(filename_from_url_path("/"), None);
    }
}
