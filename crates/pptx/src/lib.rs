//! PPTX (Office Open XML) object model and placeholder substitution engine.
//!
//! A `.pptx` file is a ZIP package of XML parts. [`Deck`] loads the package
//! and its slides, [`DeckWalker`] lists native placeholders and fills
//! `{{token}}` markers from a [`deckfill_core::DataIndex`], and the result is
//! written back with every untouched part copied through unchanged.

pub mod deck;
pub mod hyperlink;
pub mod image;
pub mod package;
pub mod rels;
pub mod shape;
pub mod slide;
pub mod text;
pub mod walker;
pub mod xml;

#[cfg(test)]
mod testutil;

pub use deck::Deck;
pub use hyperlink::HyperlinkRewriter;
pub use image::{ImageSwap, ImageSwapper};
pub use shape::{Geometry, Shape, ShapeKind};
pub use slide::Slide;
pub use text::{TableSubstitutor, TextOutcome, TextSubstitutor};
pub use walker::{DeckWalker, FillSummary};
