use url::Url;

/// Accepts a bare channel id or a `youtube.com/channel/<id>` URL.
pub fn extract_channel_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let Ok(parsed_url) = Url::parse(input) else {
        // Not a URL: treat it as the id itself.
        return (!input.contains(char::is_whitespace)).then(|| input.to_string());
    };

    match parsed_url.host_str()? {
        "www.youtube.com" | "youtube.com" | "m.youtube.com" => {
            let mut segments = parsed_url.path_segments()?;
            match (segments.next(), segments.next()) {
                (Some("channel"), Some(id)) if !id.is_empty() => Some(id.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Cuts `text` to at most `max_units` UTF-16 code units, marking the cut
/// with `…`. Telegram measures message length this way.
pub fn truncate_utf16(text: &str, max_units: usize) -> String {
    if text.encode_utf16().count() <= max_units {
        return text.to_string();
    }

    let budget = max_units.saturating_sub('…'.len_utf16());
    let mut used = 0;
    let mut truncated = String::new();
    for c in text.chars() {
        used += c.len_utf16();
        if used > budget {
            break;
        }
        truncated.push(c);
    }
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ids_pass_through() {
        assert_eq!(extract_channel_id("  UCabc ").as_deref(), Some("UCabc"));
        assert_eq!(
            extract_channel_id("UC-y-1_xHnFxI5aYgZ2vYm5Q").as_deref(),
            Some("UC-y-1_xHnFxI5aYgZ2vYm5Q")
        );
        assert!(extract_channel_id("").is_none());
        assert!(extract_channel_id("two words").is_none());
    }

    #[test]
    fn channel_urls_are_unwrapped() {
        assert_eq!(
            extract_channel_id("https://www.youtube.com/channel/UCTeLqJq1mXUX5WWoNXLmOIA")
                .as_deref(),
            Some("UCTeLqJq1mXUX5WWoNXLmOIA")
        );
        assert_eq!(
            extract_channel_id("https://m.youtube.com/channel/UCabc/videos").as_deref(),
            Some("UCabc")
        );
    }

    #[test]
    fn other_urls_are_rejected() {
        assert!(extract_channel_id("https://www.youtube.com/@handle").is_none());
        assert!(extract_channel_id("https://example.com/channel/UCabc").is_none());
    }

    #[test]
    fn truncation_counts_utf16_units() {
        assert_eq!(truncate_utf16("económico", 20), "económico");
        assert_eq!(truncate_utf16("económico", 4), "eco…");
        assert_eq!(truncate_utf16("abc", 3), "abc");
    }

    #[test]
    fn astral_characters_count_twice() {
        let emoji = "📉".repeat(3000);
        assert_eq!(emoji.chars().count(), 3000);

        let cut = truncate_utf16(&emoji, 4096);
        assert!(cut.encode_utf16().count() <= 4096);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.chars().filter(|c| *c == '📉').count(), 2047);

        // Never splits a surrogate pair.
        assert_eq!(truncate_utf16("a📉b", 3), "a…");
    }
}
