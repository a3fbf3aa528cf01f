//! Pull the literal file payload out of a model response.
//!
//! Models wrap files in triple-backtick fences, usually with prose around them.
//! The first fence wins: later blocks are ignored even when they look more
//! relevant, and nested fences are not understood (the first closing fence ends
//! the block). Callers that need several files ask for one file per prompt.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```([\w+.#-]*)[ \t]*\r?\n(.*?)```").expect("fence regex is valid")
});

/// A fenced block found in model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FencedBlock<'a> {
    /// Language tag on the opening fence (empty when untagged).
    pub tag: &'a str,
    /// Interior text, untrimmed.
    pub body: &'a str,
}

/// All fenced blocks in order of appearance.
pub fn fenced_blocks(text: &str) -> impl Iterator<Item = FencedBlock<'_>> {
    FENCE_REGEX.captures_iter(text).filter_map(|caps| {
        Some(FencedBlock {
            tag: caps.get(1)?.as_str(),
            body: caps.get(2)?.as_str(),
        })
    })
}

/// Trimmed interior of the first block, restricted to blocks tagged `hint`
/// (ASCII case-insensitive) when a hint is given. An empty block yields `""`.
pub fn fenced_block<'a>(text: &'a str, hint: Option<&str>) -> Option<&'a str> {
    fenced_blocks(text)
        .find(|block| hint.map_or(true, |h| block.tag.eq_ignore_ascii_case(h)))
        .map(|block| block.body.trim())
}

/// Extract the file payload from `model_text`.
///
/// Preference order: first block tagged `hint`, then first block of any tag,
/// then the whole trimmed response. Once a fence is found its interior is
/// returned even when empty; fence markers never leak into the payload.
pub fn extract(model_text: &str, hint: Option<&str>) -> String {
    hint.and_then(|h| fenced_block(model_text, Some(h)))
        .or_else(|| fenced_block(model_text, None))
        .unwrap_or_else(|| model_text.trim())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hinted_block() {
        let text = "Here is the file:\n```html\n<h1>Hi</h1>\n```\nEnjoy!";
        assert_eq!(extract(text, Some("html")), "<h1>Hi</h1>");
    }

    #[test]
    fn test_prose_only_is_returned_verbatim() {
        assert_eq!(
            extract("Just some text, no code block.", None),
            "Just some text, no code block."
        );
        assert_eq!(extract("  padded prose \n", None), "padded prose");
        assert_eq!(extract("", None), "");
    }

    #[test]
    fn test_hint_skips_blocks_with_other_tags() {
        let text = "```css\nbody {}\n```\nand\n```HTML\n<p>x</p>\n```";
        assert_eq!(extract(text, Some("html")), "<p>x</p>");
    }

    #[test]
    fn test_missing_hint_falls_back_to_any_block() {
        let text = "```markdown\n# Title\n```";
        assert_eq!(extract(text, Some("html")), "# Title");
    }

    #[test]
    fn test_first_block_wins_without_hint() {
        let text = "Example usage:\n```bash\nnpm start\n```\nThe file:\n```js\nconsole.log(1);\n```";
        assert_eq!(extract(text, None), "npm start");
    }

    #[test]
    fn test_untagged_block() {
        let text = "```\nMIT License\n\nCopyright\n```";
        assert_eq!(extract(text, None), "MIT License\n\nCopyright");
    }

    #[test]
    fn test_first_closing_fence_terminates_block() {
        let text = "```md\nouter\n```inner```\n```";
        assert_eq!(extract(text, None), "outer");
    }

    #[test]
    fn test_empty_block_yields_empty_payload() {
        assert_eq!(extract("```\n\n```", None), "");
        assert_eq!(extract("Here:\n```html\n\n```\nDone", Some("html")), "");
        // The first block wins even when a later one has content.
        let text = "```\n   \n```\n```txt\npayload\n```";
        assert_eq!(extract(text, None), "");
    }

    #[test]
    fn test_unterminated_fence_returns_full_text() {
        let text = "```html\n<h1>never closed";
        assert_eq!(extract(text, Some("html")), text);
    }

    #[test]
    fn test_fenced_block_is_strict_about_hint() {
        let text = "```css\nbody {}\n```";
        assert_eq!(fenced_block(text, Some("html")), None);
        assert_eq!(fenced_block(text, Some("css")), Some("body {}"));
        assert_eq!(fenced_block("no fences", None), None);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "```html\r\n<b>ok</b>\r\n```";
        assert_eq!(extract(text, Some("html")), "<b>ok</b>");
    }
}
