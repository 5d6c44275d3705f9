pub mod document;
pub mod stock;

/// Creation timestamps are stored as RFC 3339 UTC strings truncated to whole
/// seconds, which keeps them lexicographically sortable.
#[must_use]
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_has_whole_seconds() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert!(!ts.contains('.'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
