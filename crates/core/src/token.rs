//! `{{token}}` recognition.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Smallest span between `{{` and `}}`, across line breaks.
static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").unwrap());

/// A `{{name}}` occurrence in a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'t> {
    /// The full matched span, braces included.
    pub raw: &'t str,

    /// The inner text with surrounding whitespace trimmed.
    pub name: &'t str,
}

impl<'t> Token<'t> {
    fn from_captures(caps: &Captures<'t>) -> Self {
        let raw = caps.get(0).map_or("", |m| m.as_str());
        let name = caps.get(1).map_or("", |m| m.as_str()).trim();
        Self { raw, name }
    }
}

/// Finds tokens in text and rewrites them.
///
/// Holds no state between calls; construct one and pass it to every substitutor.
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    regex: Regex,
}

impl TokenMatcher {
    /// Create a new matcher.
    pub fn new() -> Self {
        Self {
            regex: TOKEN_REGEX.clone(),
        }
    }

    /// Whether `text` contains at least one token.
    pub fn has_tokens(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Replace every token with the value returned by `resolve`.
    ///
    /// When `resolve` returns `None` the raw token text is kept.
    pub fn replace_all<'t, F>(&self, text: &'t str, mut resolve: F) -> Cow<'t, str>
    where
        F: FnMut(&Token<'_>) -> Option<String>,
    {
        self.regex.replace_all(text, |caps: &Captures<'_>| {
            let token = Token::from_captures(caps);
            resolve(&token).unwrap_or_else(|| token.raw.to_string())
        })
    }
}

impl Default for TokenMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (raw, name) of every token seen while replacing, in order.
    fn seen(text: &str) -> Vec<(String, String)> {
        let mut seen = Vec::new();
        TokenMatcher::new().replace_all(text, |t| {
            seen.push((t.raw.to_string(), t.name.to_string()));
            None
        });
        seen
    }

    #[test]
    fn test_tokens_trimmed() {
        let tokens = seen("Hi {{ name }} and {{other}}");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], ("{{ name }}".to_string(), "name".to_string()));
        assert_eq!(tokens[1].1, "other");
    }

    #[test]
    fn test_non_greedy() {
        let names: Vec<_> = seen("{{a}} middle {{b}}").into_iter().map(|t| t.1).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_multiline_token() {
        let matcher = TokenMatcher::new();
        let out = matcher.replace_all("{{first\nsecond}}", |t| Some(t.name.replace('\n', "+")));
        assert_eq!(out, "first+second");
    }

    #[test]
    fn test_no_tokens() {
        let matcher = TokenMatcher::new();
        assert!(!matcher.has_tokens("plain {text} here"));
        assert!(matcher.has_tokens("{{x}}"));
        assert!(matches!(matcher.replace_all("plain", |_| None), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_replace_all_keeps_unresolved() {
        let matcher = TokenMatcher::new();
        let out = matcher.replace_all("{{a}}-{{b}}", |t| (t.name == "a").then(|| "A".to_string()));
        assert_eq!(out, "A-{{b}}");
    }
}
