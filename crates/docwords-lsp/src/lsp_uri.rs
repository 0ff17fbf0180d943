//! `file://` URI <-> path conversion.

use std::path::{Path, PathBuf};

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Percent-decode a URI path. Malformed escapes are kept literally.
pub fn percent_decode(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(&[hi, lo]) = bytes.get(i + 1..i + 3)
            && let (Some(hi), Some(lo)) = (hex_val(hi), hex_val(lo))
        {
            out.push((hi << 4) | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Percent-encode a path for use in a `file://` URI.
pub fn percent_encode(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for &b in path.as_bytes() {
        if b.is_ascii_alphanumeric() || b"-._~/".contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Local path of a `file://` URI. Other schemes yield `None`.
pub fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    // Authority: empty or `localhost`.
    let path = match rest.find('/') {
        Some(0) => rest,
        Some(idx) if rest[..idx].eq_ignore_ascii_case("localhost") => &rest[idx..],
        _ => return None,
    };
    let mut path = percent_decode(path);
    if cfg!(windows) {
        // `/C:/dir` -> `C:\dir`
        if path.get(2..3) == Some(":") {
            path.remove(0);
        }
        path = path.replace('/', "\\");
    }
    Some(PathBuf::from(path))
}

/// `file://` URI of an absolute path.
pub fn path_to_file_uri(path: &Path) -> String {
    let mut path = path.to_string_lossy().into_owned();
    if cfg!(windows) {
        path = path.replace('\\', "/");
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
    }
    format!("file://{}", percent_encode(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(percent_decode("/tmp/a%20b%2Fc"), "/tmp/a b/c");
        assert_eq!(percent_decode("/100%"), "/100%");
        assert_eq!(percent_decode("/%zz"), "/%zz");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_uris() {
        assert_eq!(
            file_uri_to_path("file:///home/me/My%20Notes.md"),
            Some(PathBuf::from("/home/me/My Notes.md"))
        );
        assert_eq!(
            file_uri_to_path("file://localhost/etc/hosts"),
            Some(PathBuf::from("/etc/hosts"))
        );
        assert_eq!(file_uri_to_path("untitled:Untitled-1"), None);
        assert_eq!(file_uri_to_path("file://server/share"), None);
        assert_eq!(
            path_to_file_uri(Path::new("/home/me/My Notes.md")),
            "file:///home/me/My%20Notes.md"
        );
    }
}
