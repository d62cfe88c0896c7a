//! Deterministic mapping from remote URLs to local cache paths.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Extension of every cached image file; workers re-encode to PNG before
/// persisting, so the extension is always accurate.
const CACHE_FILE_EXT: &str = "png";

/// Resolves the on-disk path for a remote image URL.
///
/// Pure and deterministic: the filename is the URL-safe base64 encoding of
/// the SHA-256 digest of the URL bytes. Identical URLs always map to the
/// same path; distinct URLs collide with negligible probability.
#[must_use]
pub fn resolve(cache_dir: &Path, url: &str) -> PathBuf {
    let digest = Sha256::digest(url.as_bytes());
    let stem = URL_SAFE_NO_PAD.encode(digest);
    cache_dir.join(format!("{stem}.{CACHE_FILE_EXT}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_resolve_is_deterministic() {
        let dir = Path::new("/tmp/cache");
        let url = "https://example.com/avatars/ada.png";
        assert_eq!(resolve(dir, url), resolve(dir, url));
    }

    #[test]
    fn test_distinct_urls_never_collide() {
        let dir = Path::new("/tmp/cache");
        let mut seen = HashSet::new();
        for i in 0..1000 {
            let url = format!("https://example.com/avatars/user{i}.png?size=48");
            assert!(seen.insert(resolve(dir, &url)), "collision for {url}");
        }
    }

    #[test]
    fn test_filename_is_path_safe() {
        let dir = Path::new("/tmp/cache");
        let path = resolve(dir, "https://example.com/a/b/c?d=e&f=g+h/../../etc");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(
            name.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        );
        assert!(name.ends_with(".png"));
        assert_eq!(path.parent().unwrap(), dir);
    }

    #[test]
    fn test_similar_urls_resolve_apart() {
        let dir = Path::new("/tmp/cache");
        let a = resolve(dir, "https://example.com/a.png");
        let b = resolve(dir, "https://example.com/a.png?v=2");
        assert_ne!(a, b);
    }
}
