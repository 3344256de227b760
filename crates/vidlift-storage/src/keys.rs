//! Object key derivation.

/// Key for `file_name` under `prefix` (`{prefix}/{file_name}`, or just the
/// file name when the prefix is empty).
pub fn object_key(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}
