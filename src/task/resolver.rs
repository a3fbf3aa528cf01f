//! Requirement-to-file resolution.
//!
//! A check is free text ("README.md is professional", "Repo has MIT license").
//! A check only yields a filename when it matches a known artifact, names a file
//! with a recognized extension, or is itself a single dotted token. Anything
//! else ("the button should be blue") resolves to `None` and is skipped.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Ordered `(pattern, filename)` table. Earlier entries win.
pub const KNOWN_PATTERNS: &[(&str, &str)] = &[
    (r"index\.html", "index.html"),
    (r"README\.md", "README.md"),
    (r"LICENSE", "LICENSE"),
    (r"style\.css", "style.css"),
    (r"script\.js", "script.js"),
    (r"main\.js", "main.js"),
    (r"app\.js", "app.js"),
    (r"package\.json", "package.json"),
];

/// Extensions accepted by the extension sniff.
pub const RECOGNIZED_EXTENSIONS: [&str; 7] = ["html", "css", "js", "md", "json", "txt", "py"];

static KNOWN_REGEXES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    KNOWN_PATTERNS
        .iter()
        .map(|(pattern, filename)| {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("known file pattern is a valid regex");
            (re, *filename)
        })
        .collect()
});

static EXTENSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"\b(\w+\.(?:{}))\b", RECOGNIZED_EXTENSIONS.join("|"));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("extension sniff is a valid regex")
});

/// Which rule produced a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveRule {
    KnownPattern,
    Extension,
    SingleToken,
}

/// A check together with the file it maps to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    pub filename: Option<String>,
    pub source_check: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<ResolveRule>,
}

/// Map one check to a filename, or `None` when nothing names a file.
pub fn resolve(check: &str) -> Option<String> {
    resolve_with_rule(check).map(|(filename, _)| filename)
}

/// Like [`resolve`], also reporting which rule matched.
pub fn resolve_with_rule(check: &str) -> Option<(String, ResolveRule)> {
    if let Some(filename) = KNOWN_REGEXES
        .iter()
        .find(|(re, _)| re.is_match(check))
        .map(|(_, filename)| *filename)
    {
        return Some((filename.to_string(), ResolveRule::KnownPattern));
    }

    if let Some(m) = EXTENSION_REGEX.captures(check).and_then(|c| c.get(1)) {
        return Some((m.as_str().to_string(), ResolveRule::Extension));
    }

    let trimmed = check.trim();
    if trimmed.contains('.') && trimmed.split_whitespace().count() == 1 {
        return Some((trimmed.to_string(), ResolveRule::SingleToken));
    }

    None
}

/// Resolve every check in order. Duplicates are kept.
pub fn resolve_checks<S: AsRef<str>>(checks: &[S]) -> Vec<ResolvedFile> {
    checks
        .iter()
        .map(|check| {
            let check = check.as_ref();
            let resolved = resolve_with_rule(check);
            ResolvedFile {
                filename: resolved.as_ref().map(|(f, _)| f.clone()),
                source_check: check.to_string(),
                rule: resolved.map(|(_, r)| r),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_patterns_win_regardless_of_case_and_context() {
        assert_eq!(resolve("README.md is professional").as_deref(), Some("README.md"));
        assert_eq!(resolve("the readme.MD must list features").as_deref(), Some("README.md"));
        assert_eq!(resolve("Repo has MIT license").as_deref(), Some("LICENSE"));
        assert_eq!(resolve("Serve an INDEX.HTML page").as_deref(), Some("index.html"));
        assert_eq!(resolve("package.json declares deps").as_deref(), Some("package.json"));
    }

    #[test]
    fn test_table_order_breaks_ties() {
        // Both index.html and style.css appear; index.html is first in the table.
        assert_eq!(
            resolve("style.css is linked from index.html").as_deref(),
            Some("index.html")
        );
        // LICENSE precedes script.js.
        assert_eq!(
            resolve("script.js carries the license header").as_deref(),
            Some("LICENSE")
        );
    }

    #[test]
    fn test_single_canonical_name() {
        assert_eq!(resolve("style.css").as_deref(), Some("style.css"));
        assert_eq!(
            resolve_with_rule("style.css").map(|(_, r)| r),
            Some(ResolveRule::KnownPattern)
        );
    }

    #[test]
    fn test_extension_sniff_returns_literal_token() {
        assert_eq!(
            resolve_with_rule("Add a solver.py helper"),
            Some(("solver.py".to_string(), ResolveRule::Extension))
        );
        assert_eq!(resolve("Ship data.json with the page").as_deref(), Some("data.json"));
        assert_eq!(resolve("Keep Notes.TXT around").as_deref(), Some("Notes.TXT"));
    }

    #[test]
    fn test_recognized_extension_set_is_exact() {
        assert_eq!(
            RECOGNIZED_EXTENSIONS,
            ["html", "css", "js", "md", "json", "txt", "py"]
        );
        for ext in RECOGNIZED_EXTENSIONS {
            let check = format!("please add thing.{ext} here");
            assert_eq!(resolve(&check), Some(format!("thing.{ext}")), "ext {ext}");
        }
        for ext in ["yaml", "yml", "toml", "ts", "jsx", "rs", "xml", "htm"] {
            let check = format!("please add thing.{ext} here");
            assert_eq!(resolve(&check), None, "ext {ext} should not be sniffed");
        }
    }

    #[test]
    fn test_unrecognized_extension_in_sentence_is_skipped() {
        assert_eq!(resolve("please add config.yaml here"), None);
    }

    #[test]
    fn test_single_dotted_token_fallback() {
        assert_eq!(
            resolve_with_rule("  config.yaml  "),
            Some(("config.yaml".to_string(), ResolveRule::SingleToken))
        );
        assert_eq!(resolve("robots.xml").as_deref(), Some("robots.xml"));
    }

    #[test]
    fn test_prose_without_filename_is_skipped() {
        assert_eq!(resolve("the app needs a nice font"), None);
        assert_eq!(resolve("Page displays solved captcha text within 15 seconds"), None);
        assert_eq!(resolve("nodots"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn test_resolve_checks_preserves_order_and_duplicates() {
        let resolved = resolve_checks(&[
            "index.html exists",
            "Page looks nice",
            "INDEX.HTML has a title",
        ]);
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].filename.as_deref(), Some("index.html"));
        assert_eq!(resolved[1].filename, None);
        assert_eq!(resolved[1].rule, None);
        assert_eq!(resolved[1].source_check, "Page looks nice");
        assert_eq!(resolved[2].filename.as_deref(), Some("index.html"));
    }
}
