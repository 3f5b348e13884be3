//! Core data model, slide data indexing and token resolution for filling
//! PowerPoint templates.

pub mod data;
pub mod error;
pub mod options;
pub mod resolve;
pub mod token;
pub mod types;

pub use data::DataIndex;
pub use error::{Error, Result};
pub use options::FillOptions;
pub use resolve::{resolve_literal, resolve_token, substitute_literal, substitute_text, Resolution, Substitution};
pub use token::{Token, TokenMatcher};
pub use types::{ContentMap, ImageFormat, InputRow, PlaceholderReport, PlaceholderType, SlideRecord};
