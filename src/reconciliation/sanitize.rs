//! Gift-message extraction and sanitization.
//!
//! Messages arrive as free-text line-item properties typed by shoppers into
//! third-party storefront themes, so anything HTML-shaped is stripped before
//! storage. Extraction prefers the typed property key; the substring match is
//! a compatibility shim for themes that predate the constant and will be
//! removed once no active theme relies on it.

use std::sync::OnceLock;

use regex::Regex;

use super::payload::LineItemProperty;

/// Canonical line-item property carrying the gift message
pub const GIFT_MESSAGE_PROPERTY: &str = "_gift_message";

/// Longest gift message persisted; the remainder is dropped
const MAX_MESSAGE_CHARS: usize = 500;

fn script_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("static regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"))
}

/// Strip HTML/script content from a gift message and cap its length.
///
/// Returns None when nothing printable survives.
pub fn sanitize_message(raw: &str) -> Option<String> {
    let without_scripts = script_block_re().replace_all(raw, "");
    let without_tags = tag_re().replace_all(&without_scripts, "");

    let cleaned = without_tags.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return None;
    }

    Some(cleaned.chars().take(MAX_MESSAGE_CHARS).collect())
}

/// Find the gift message among line-item properties.
///
/// Typed lookup of [`GIFT_MESSAGE_PROPERTY`] wins; otherwise fall back to the
/// first property whose name contains "gift" or "message" case-insensitively
/// (legacy theme shim).
pub fn extract_gift_message(properties: &[LineItemProperty]) -> Option<String> {
    let raw = properties
        .iter()
        .find(|p| p.name == GIFT_MESSAGE_PROPERTY)
        .or_else(|| {
            properties.iter().find(|p| {
                let name = p.name.to_lowercase();
                name.contains("gift") || name.contains("message")
            })
        })
        .map(|p| p.value.as_str())?;

    sanitize_message(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, value: &str) -> LineItemProperty {
        LineItemProperty {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn strips_script_blocks_including_content() {
        let message = "Congrats!<script>alert('xss')</script> Love, us";
        assert_eq!(
            sanitize_message(message),
            Some("Congrats! Love, us".to_string())
        );
    }

    #[test]
    fn strips_plain_tags_but_keeps_text() {
        let message = "<b>Happy</b> wedding <i>day</i>";
        assert_eq!(
            sanitize_message(message),
            Some("Happy wedding day".to_string())
        );
    }

    #[test]
    fn empty_after_sanitization_is_none() {
        assert_eq!(sanitize_message("<script>evil()</script>"), None);
        assert_eq!(sanitize_message("   "), None);
    }

    #[test]
    fn caps_length() {
        let long = "a".repeat(2000);
        let sanitized = sanitize_message(&long).unwrap();
        assert_eq!(sanitized.chars().count(), 500);
    }

    #[test]
    fn typed_key_wins_over_shim() {
        let properties = vec![
            prop("Gift note", "from the shim"),
            prop("_gift_message", "from the typed key"),
        ];
        assert_eq!(
            extract_gift_message(&properties),
            Some("from the typed key".to_string())
        );
    }

    #[test]
    fn shim_matches_case_insensitive_substring() {
        let properties = vec![
            prop("_registry_item_id", "3f2c"),
            prop("Personal Message", "see you there"),
        ];
        assert_eq!(
            extract_gift_message(&properties),
            Some("see you there".to_string())
        );
    }

    #[test]
    fn no_matching_property_is_none() {
        let properties = vec![prop("_registry_item_id", "3f2c")];
        assert_eq!(extract_gift_message(&properties), None);
    }
}
