//! Run configuration shared by data loading and substitution.

use std::path::{Path, PathBuf};

/// File extensions that mark an in-text token as an image reference.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif"];

/// Options controlling how slide data is read and how tokens resolve.
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// CSV field delimiter.
    pub delimiter: u8,

    /// Base directory for relative image paths. `None` uses the working directory.
    pub image_root: Option<PathBuf>,

    /// Lower-case token suffixes that denote an image.
    pub image_extensions: Vec<String>,
}

impl FillOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CSV field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Resolve relative image paths against `root`.
    pub fn with_image_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.image_root = Some(root.into());
        self
    }

    /// Whether a token name refers to an image (case-insensitive suffix check).
    pub fn is_image_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.image_extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
    }

    /// Turn a value from the data file into a filesystem path.
    pub fn resolve_path(&self, value: &str) -> PathBuf {
        let path = Path::new(value);
        match &self.image_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Resolve `value` and return it only if it names an existing regular file.
    pub fn existing_file(&self, value: &str) -> Option<PathBuf> {
        if value.is_empty() {
            return None;
        }
        let path = self.resolve_path(value);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            image_root: None,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
