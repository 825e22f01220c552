/// Outcome of comparing a cached content hash with the deployed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Stored hash matches; the cached blob may be served.
    Fresh,
    /// Stored hash differs. Left in place until the next write supersedes it.
    Stale,
    /// Nothing stored under the key.
    Absent,
}

impl Freshness {
    pub fn is_fresh(self) -> bool {
        self == Freshness::Fresh
    }
}

/// An empty expected hash never matches, so a deployment without a hash is
/// always fetched from the network.
pub fn check(stored: Option<&str>, expected: &str) -> Freshness {
    match stored {
        None => Freshness::Absent,
        Some(stored) if !expected.is_empty() && stored == expected => Freshness::Fresh,
        Some(_) => Freshness::Stale,
    }
}
