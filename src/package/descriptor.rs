use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left as-is by `encodeURIComponent`.
const URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Identifies one versioned package. Immutable for the life of a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Digest computed at packaging time. Used only to decide cache freshness.
    pub content_hash: String,
    pub remote_url: String,
    pub expected_size: u64,
    /// Namespaces cache entries per deployed build.
    pub cache_key: String,
    /// Package file name, used for the package run dependency and log lines.
    pub package_name: String,
}

impl PackageDescriptor {
    /// Descriptor for a package deployed as `prefix_url + package_name`.
    ///
    /// The cache key is the percent-encoded deployment prefix followed by the
    /// file name, so two builds deployed under different paths never share an
    /// entry.
    pub fn for_deployment(
        prefix_url: &str,
        package_name: &str,
        expected_size: u64,
        content_hash: &str,
    ) -> Self {
        Self {
            content_hash: content_hash.to_string(),
            remote_url: format!("{}{}", prefix_url, package_name),
            expected_size,
            cache_key: cache_key_for(prefix_url, package_name),
            package_name: package_name.to_string(),
        }
    }
}

pub fn cache_key_for(prefix_url: &str, package_name: &str) -> String {
    format!(
        "{}{}",
        utf8_percent_encode(prefix_url, URI_COMPONENT_SET),
        package_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_for_deployment() {
        let d = PackageDescriptor::for_deployment("/games/pong/", "pong.data", 1000, "abc123");
        assert_eq!(d.remote_url, "/games/pong/pong.data");
        assert_eq!(d.cache_key, "%2Fgames%2Fpong%2Fpong.data");
        assert_eq!(d.expected_size, 1000);
        assert_eq!(d.content_hash, "abc123");
        assert_eq!(d.package_name, "pong.data");
    }

    #[test]
    fn test_cache_key_separates_deployments() {
        assert_ne!(
            cache_key_for("/a/", "game.data"),
            cache_key_for("/b/", "game.data")
        );
        assert_eq!(cache_key_for("", "game.data"), "game.data");
    }
}
