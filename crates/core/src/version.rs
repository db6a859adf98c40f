//! Optimistic concurrency primitives shared by every versioned record.

/// Optimistic concurrency expectation for a versioned record.
///
/// Backends bump a record's version on every successful write; writers that
/// read-then-write pass the version they read to detect interleaved writes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (last writer wins).
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_matches_every_version() {
        assert!(ExpectedVersion::Any.matches(0));
        assert!(ExpectedVersion::Any.matches(42));
    }

    #[test]
    fn exact_rejects_stale_version() {
        assert!(ExpectedVersion::Exact(3).matches(3));
        assert!(!ExpectedVersion::Exact(3).matches(4));
    }
}
