// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Small formatting helpers for console output.

/// Format a count with its noun, pluralized when needed ("1 frame", "3 frames").
#[must_use]
pub fn pluralize(count: usize, word: &str) -> String {
    if count == 1 {
        return format!("{count} {word}");
    }
    let plural = if word.ends_with('s') || word.ends_with("ch") || word.ends_with("sh") {
        format!("{word}es")
    } else if word.ends_with('y') && !word.ends_with("ey") && !word.ends_with("ay") {
        format!("{}ies", &word[..word.len() - 1])
    } else {
        format!("{word}s")
    };
    format!("{count} {plural}")
}
