//! ASCII scene layers (`.usda`)
//!
//! Supports the subset the viewer needs: layer and prim metadata, nested
//! `def`/`over`/`class` blocks, typed attributes with defaults and time
//! samples, relationships and connections. Composition arcs and variant sets
//! are parsed and ignored.

mod lexer;
mod parser;

use crate::error::IoError;
use crate::layer::Layer;
use crate::registry::{StageReader, HEADER_LEN};
use crate::stage::Stage;
use primview_core::{Error, Result};
use std::path::Path;

pub use lexer::{Lexer, Spanned, Token};
pub use parser::Parser;

/// Leading magic of every ASCII layer
pub const HEADER: &str = "#usda";

/// Leading magic of binary crate layers, which share the `.usd` extension
pub const CRATE_MAGIC: &[u8] = b"PXR-USDC";

/// Parse layer text. The `#usda` header line is required.
pub fn parse_layer(source: &str) -> std::result::Result<Layer, IoError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    if !source.trim_start().starts_with(HEADER) {
        return Err(IoError::InvalidFormat {
            format: format!("missing `{} 1.0` header", HEADER),
        });
    }
    Parser::new(source)?.parse_layer()
}

/// Reader for `.usda` files, and `.usd` files holding ASCII layers
#[derive(Debug, Default, Clone, Copy)]
pub struct UsdaReader;

impl StageReader for UsdaReader {
    fn read_stage(&self, path: &Path) -> Result<Stage> {
        let bytes = std::fs::read(path)?;
        let header = &bytes[..bytes.len().min(HEADER_LEN)];
        if !self.can_read(header) {
            let kind = if header.starts_with(CRATE_MAGIC) {
                "binary crate layers are not supported"
            } else {
                "missing `#usda` header"
            };
            return Err(Error::UnsupportedFormat(format!("{}: {}", path.display(), kind)));
        }

        let source = String::from_utf8(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let layer = parse_layer(&source)?;
        Ok(Stage::from_layer(layer).with_source(path))
    }

    fn can_read(&self, header: &[u8]) -> bool {
        let text = String::from_utf8_lossy(header);
        text.trim_start_matches('\u{feff}').trim_start().starts_with(HEADER)
    }

    fn format_name(&self) -> &'static str {
        "usda"
    }

    fn extensions(&self) -> &[&'static str] {
        &["usda", "usd"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_required() {
        assert!(matches!(
            parse_layer("def Xform \"A\" {}"),
            Err(IoError::InvalidFormat { .. })
        ));
        let layer = parse_layer("#usda 1.0\ndef Xform \"A\" {}").unwrap();
        assert_eq!(layer.root_prims.len(), 1);
    }

    #[test]
    fn test_can_read() {
        assert!(UsdaReader.can_read(b"#usda 1.0\n("));
        assert!(!UsdaReader.can_read(b"PXR-USDC"));
        assert!(!UsdaReader.can_read(b"v 0 0 0\n"));
    }
}
