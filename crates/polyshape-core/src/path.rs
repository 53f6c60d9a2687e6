/// Returns the last segment of a pathname, percent-decoded when possible.
///
/// Trailing slashes are ignored. When the segment is not valid percent-encoded
/// UTF-8 the raw segment is returned instead.
///
/// # Examples
///
/// ```
/// use polyshape_core::path::last_path_segment;
///
/// assert_eq!(last_path_segment("/foo/bar/test.json"), "test.json");
/// assert_eq!(last_path_segment("/foo/bar/test%20file.json"), "test file.json");
/// assert_eq!(last_path_segment("/foo/bar/"), "bar");
/// ```
pub fn last_path_segment(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let raw = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };

    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_segment() {
        assert_eq!(last_path_segment("/publications/paper.json"), "paper.json");
    }

    #[test]
    fn test_no_slash() {
        assert_eq!(last_path_segment("file.json"), "file.json");
    }

    #[test]
    fn test_trailing_slashes() {
        assert_eq!(last_path_segment("/a/b///"), "b");
    }

    #[test]
    fn test_empty_and_root() {
        assert_eq!(last_path_segment(""), "");
        assert_eq!(last_path_segment("/"), "");
    }

    #[test]
    fn test_decodes_percent_escapes() {
        assert_eq!(last_path_segment("/x/caf%C3%A9.json"), "café.json");
    }

    #[test]
    fn test_invalid_utf8_returns_raw() {
        assert_eq!(last_path_segment("/x/bad%E0%A4%A.json"), "bad%E0%A4%A.json");
        assert_eq!(last_path_segment("/x/%FF"), "%FF");
    }
}
