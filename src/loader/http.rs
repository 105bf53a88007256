//! The on-disk cache for documents fetched over HTTP(S): keyed by the MD5 of
//! the namespace URL, so repeated runs against the same remote schema don't
//! re-fetch it every time.
use md5::{Digest, Md5};
use std::{fs, path::PathBuf};
use url::Url;

pub(super) fn cache_path(cache_dir: &std::path::Path, namespace: &Url) -> PathBuf {
    let mut hasher = Md5::new();
    hasher.update(namespace.as_str().as_bytes());
    let digest = hasher.finalize();
    cache_dir.join(format!("{:x}", digest))
}

pub(super) fn read(cache_dir: &std::path::Path, namespace: &Url) -> Option<String> {
    fs::read_to_string(cache_path(cache_dir, namespace)).ok()
}

pub(super) fn write(cache_dir: &std::path::Path, namespace: &Url, body: &str) {
    if fs::create_dir_all(cache_dir).is_ok() {
        let _ = fs::write(cache_path(cache_dir, namespace), body);
    }
}

#[cfg(test)]
mod tests {
    use super::{cache_path, read, write};
    use url::Url;

    #[test]
    fn same_namespace_hashes_to_the_same_path() {
        let dir = std::path::Path::new("/tmp/cache");
        let namespace = Url::parse("https://example.com/schema.json").unwrap();
        assert_eq!(cache_path(dir, &namespace), cache_path(dir, &namespace));
    }

    #[test]
    fn write_then_read_round_trips_through_a_real_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let namespace = Url::parse("https://example.com/schema.json").unwrap();
        assert!(read(dir.path(), &namespace).is_none());
        write(dir.path(), &namespace, r#"{"type": "string"}"#);
        assert_eq!(read(dir.path(), &namespace).as_deref(), Some(r#"{"type": "string"}"#));
    }
}
