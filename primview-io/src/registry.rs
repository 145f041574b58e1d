//! Reader registry for format-agnostic stage loading
//!
//! Readers are looked up by file extension first; when the extension is
//! unknown or missing the first bytes of the file are offered to each reader.

use crate::error::IoError;
use crate::obj::ObjReader;
use crate::stage::Stage;
use crate::usda::UsdaReader;
use log::debug;
use primview_core::{Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub(crate) const HEADER_LEN: usize = 256;

/// Something that can turn a file into a [`Stage`]
pub trait StageReader: Send + Sync {
    /// Read a stage from the given path
    fn read_stage(&self, path: &Path) -> Result<Stage>;

    /// Check if this reader recognizes a file from its first bytes
    fn can_read(&self, header: &[u8]) -> bool;

    /// Get the format name this reader handles
    fn format_name(&self) -> &'static str;

    /// Lowercase file extensions this reader claims
    fn extensions(&self) -> &[&'static str];
}

/// Registry of stage readers keyed by format name
pub struct ReaderRegistry {
    readers: Vec<Box<dyn StageReader>>,
    by_extension: HashMap<String, usize>,
}

impl ReaderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Registry with the USDA and OBJ readers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(UsdaReader));
        registry.register(Box::new(ObjReader));
        registry
    }

    /// Register a reader; later readers take over extensions already claimed
    pub fn register(&mut self, reader: Box<dyn StageReader>) {
        let index = self.readers.len();
        for ext in reader.extensions() {
            self.by_extension.insert(ext.to_lowercase(), index);
        }
        self.readers.push(reader);
    }

    /// Format names in registration order
    pub fn supported_formats(&self) -> Vec<&'static str> {
        self.readers.iter().map(|r| r.format_name()).collect()
    }

    pub fn supports_extension(&self, ext: &str) -> bool {
        self.by_extension.contains_key(&ext.to_lowercase())
    }

    /// Find the reader for `path` without reading the whole file
    pub fn reader_for(&self, path: &Path) -> Result<&dyn StageReader> {
        if !path.exists() {
            return Err(IoError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase);
        if let Some(&index) = ext.as_ref().and_then(|e| self.by_extension.get(e)) {
            return Ok(self.readers[index].as_ref());
        }

        let header = read_header(path)?;
        if let Some(reader) = self.readers.iter().find(|r| r.can_read(&header)) {
            debug!(
                "Detected {} from header of {}",
                reader.format_name(),
                path.display()
            );
            return Ok(reader.as_ref());
        }

        Err(Error::UnsupportedFormat(format!(
            "no reader for {} (extension {:?})",
            path.display(),
            ext.unwrap_or_default()
        )))
    }

    /// Read a stage, picking the reader by extension and then by header
    pub fn read_stage(&self, path: &Path) -> Result<Stage> {
        self.reader_for(path)?.read_stage(path)
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn read_header(path: &Path) -> Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}
