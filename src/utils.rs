// src/utils.rs
use anyhow::{Context, Result};
use std::path::Path;

/// Collapse scraped page text: trims every line, drops empty lines,
/// squeezes runs of spaces and tabs into a single space.
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Normalize a display name for lookups (trim + collapse inner whitespace)
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Read file content as string with proper error context
pub async fn read_file_content(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Pretty JSON for terminal output. Non-ASCII text is kept as-is.
pub fn to_pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        let raw = "  Hello\t\tworld  \n\n\n\n  second   line \n\t\n";
        assert_eq!(clean_text(raw), "Hello world\nsecond line");
    }

    #[test]
    fn test_truncate_to_char_boundary() {
        let text = "Hello 세계";
        let truncated = truncate_to_char_boundary(text, 8);
        assert!(truncated.len() <= 8);
        assert!(text.starts_with(truncated));
        assert_eq!(truncate_to_char_boundary("Hello", 100), "Hello");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Jane   Doe "), "Jane Doe");
        assert_eq!(normalize_name("토스"), "토스");
    }

    #[test]
    fn test_to_pretty_json_keeps_unicode() {
        let value = serde_json::json!({ "name": "업스테이지" });
        assert!(to_pretty_json(&value).contains("업스테이지"));
    }

    #[tokio::test]
    async fn test_read_file_content_missing() {
        let err = read_file_content(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
