/// Truncate a string to at most `max` characters, appending an ellipsis
/// when anything was cut. Unicode-safe (counts chars, not bytes).
pub fn truncate(s: &str, max: usize) -> String {
    let mut chars = s.char_indices();
    match chars.nth(max) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
    }
}

/// Milliseconds since the Unix epoch, used to timestamp telemetry events.
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn test_truncate_short_input_untouched() {
        assert_eq!(truncate("ok", 10), "ok");
        assert_eq!(truncate("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        assert_eq!(truncate("abcdef", 3), "abc...");
    }

    #[test]
    fn test_truncate_unicode_safe() {
        assert_eq!(truncate("こんにちは", 3), "こんに...");
    }

    #[test]
    fn test_truncated_text_is_prefix() {
        let input = "x".repeat(80);
        let out = truncate(&input, 50);
        assert!(input.starts_with(out.trim_end_matches("...")));
        assert_eq!(out.trim_end_matches("...").chars().count(), 50);
    }
}
