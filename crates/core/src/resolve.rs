//! Token resolution against a slide's content mapping.
//!
//! A token either becomes literal text, becomes an image reference, or is left
//! as it was. Nothing here touches a document; callers decide what an image
//! reference means for the shape that owned the text.

use crate::options::FillOptions;
use crate::token::{Token, TokenMatcher};
use crate::types::ContentMap;
use std::path::PathBuf;

/// What a single token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Insert this text in place of the token.
    Literal(String),
    /// The token names an image that exists on disk.
    Image(PathBuf),
    /// No usable value; keep the token text.
    Unresolved,
}

/// Resolve a token name, treating image-like names as image references.
pub fn resolve_token(name: &str, content: &ContentMap, options: &FillOptions) -> Resolution {
    if options.is_image_name(name) {
        return match content.get(name).and_then(|value| options.existing_file(value)) {
            Some(path) => Resolution::Image(path),
            None => {
                log::debug!("Image token '{}' has no existing file, leaving it in place", name);
                Resolution::Unresolved
            }
        };
    }
    resolve_literal(name, content)
}

/// Resolve a token name as plain text only.
pub fn resolve_literal(name: &str, content: &ContentMap) -> Resolution {
    match content.get(name) {
        Some(value) => Resolution::Literal(value.clone()),
        None => {
            log::debug!("No value for token '{}'", name);
            Resolution::Unresolved
        }
    }
}

/// Result of substituting the tokens of one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    /// The rewritten text.
    pub text: String,

    /// Tokens replaced with text or removed for an image.
    pub replaced: usize,

    /// Images referenced by tokens, in order of appearance.
    pub images: Vec<PathBuf>,
}

impl Substitution {
    /// Whether the text differs from the input.
    pub fn changed(&self) -> bool {
        self.replaced > 0
    }
}

/// Substitute text with image dispatch: image tokens are removed from the
/// text and reported in [`Substitution::images`].
pub fn substitute_text(
    matcher: &TokenMatcher,
    text: &str,
    content: &ContentMap,
    options: &FillOptions,
) -> Substitution {
    substitute_with(matcher, text, |token| resolve_token(token.name, content, options))
}

/// Substitute text with literal values only.
pub fn substitute_literal(matcher: &TokenMatcher, text: &str, content: &ContentMap) -> Substitution {
    substitute_with(matcher, text, |token| resolve_literal(token.name, content))
}

fn substitute_with<F>(matcher: &TokenMatcher, text: &str, mut resolve: F) -> Substitution
where
    F: FnMut(&Token<'_>) -> Resolution,
{
    let mut replaced = 0;
    let mut images = Vec::new();
    let text = matcher
        .replace_all(text, |token| match resolve(token) {
            Resolution::Literal(value) => {
                replaced += 1;
                Some(value)
            }
            Resolution::Image(path) => {
                replaced += 1;
                images.push(path);
                Some(String::new())
            }
            Resolution::Unresolved => None,
        })
        .into_owned();

    Substitution { text, replaced, images }
}
