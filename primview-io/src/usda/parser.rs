//! Recursive-descent parser building a [`Layer`] from layer tokens

use super::lexer::{Lexer, Spanned, Token};
use crate::error::IoError;
use crate::layer::{
    merge_property, AttributeSpec, Layer, Metadata, PrimSpec, PropertySpec, RawValue,
    RelationshipSpec, Specifier,
};
use crate::time::TimeSamples;
use crate::value::ValueType;
use log::{debug, warn};

/// Metadata keys for composition arcs; parsed and dropped
const COMPOSITION_KEYS: &[&str] = &[
    "references",
    "payload",
    "inherits",
    "specializes",
    "variantSets",
    "variants",
    "subLayers",
];

const LIST_OPS: &[&str] = &["prepend", "append", "add", "delete", "reorder"];

type ParseResult<T> = Result<T, IoError>;

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: Lexer::new(source).tokenize()?,
            pos: 0,
        })
    }

    pub fn parse_layer(mut self) -> ParseResult<Layer> {
        let mut layer = Layer::default();
        if self.eat_punct('(') {
            layer.metadata = self.metadata_block()?;
        }
        while !self.at_eof() {
            layer.root_prims.push(self.prim()?);
        }
        Ok(layer)
    }

    // Token cursor

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let i = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[i].token
    }

    fn current(&self) -> &Spanned {
        // The lexer always ends with Eof, so the last token is a valid fallback.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        *self.peek() == Token::Eof
    }

    fn error(&self, message: impl Into<String>) -> IoError {
        let here = self.current();
        IoError::parse(here.line, here.column, message)
    }

    fn unexpected(&self, expected: &str) -> IoError {
        self.error(format!("expected {}, found {}", expected, self.peek().describe()))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if *self.peek() == Token::Punct(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> ParseResult<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", c)))
        }
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Token::Ident(s) if s == word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().clone() {
            Token::Ident(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match self.peek().clone() {
            Token::String(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("a quoted name")),
        }
    }

    // Prims

    fn prim(&mut self) -> ParseResult<PrimSpec> {
        let keyword = self.expect_ident()?;
        let specifier = Specifier::parse(&keyword).ok_or_else(|| {
            self.error(format!("expected `def`, `over` or `class`, found `{}`", keyword))
        })?;

        let type_name = match self.peek().clone() {
            Token::Ident(t) => {
                self.advance();
                Some(t)
            }
            _ => None,
        };
        let name = self.expect_string()?;
        if !crate::path::is_valid_name(&name) {
            return Err(self.error(format!("invalid prim name {:?}", name)));
        }

        let mut prim = PrimSpec::new(specifier, type_name.as_deref(), name);
        if self.eat_punct('(') {
            prim.metadata = self.metadata_block()?;
        }
        self.expect_punct('{')?;

        while !self.eat_punct('}') {
            if self.at_eof() {
                return Err(self.unexpected("`}`"));
            }
            if self.eat_punct(';') {
                continue;
            }
            let keyword = match self.peek() {
                Token::Ident(word) => word.clone(),
                _ => String::new(),
            };
            if Specifier::parse(&keyword).is_some() {
                prim.children.push(self.prim()?);
            } else if keyword == "variantSet" {
                self.skip_variant_set()?;
            } else if keyword == "reorder" {
                self.skip_statement()?;
            } else if let Some(property) = self.property()? {
                merge_property(&mut prim.properties, property);
            }
        }
        Ok(prim)
    }

    fn skip_variant_set(&mut self) -> ParseResult<()> {
        self.advance();
        let name = self.expect_string()?;
        debug!("skipping variantSet {:?}", name);
        self.expect_punct('=')?;
        self.skip_balanced('{', '}')
    }

    /// `reorder nameChildren = [...]` and similar
    fn skip_statement(&mut self) -> ParseResult<()> {
        self.advance();
        self.expect_ident()?;
        self.expect_punct('=')?;
        self.value().map(|_| ())
    }

    fn skip_balanced(&mut self, open: char, close: char) -> ParseResult<()> {
        self.expect_punct(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Token::Punct(c) if c == open => depth += 1,
                Token::Punct(c) if c == close => depth -= 1,
                Token::Eof => return Err(self.unexpected(&format!("`{}`", close))),
                _ => {}
            }
        }
        Ok(())
    }

    // Properties

    fn property(&mut self) -> ParseResult<Option<PropertySpec>> {
        let (line, column) = (self.current().line, self.current().column);
        let mut custom = false;
        let mut uniform = false;
        loop {
            if self.eat_ident("custom") {
                custom = true;
            } else if self.eat_ident("uniform") {
                uniform = true;
            } else if self.eat_ident("varying") {
                // legacy variability keyword
            } else {
                break;
            }
        }
        for op in LIST_OPS {
            if self.eat_ident(op) {
                break;
            }
        }

        if self.eat_ident("rel") {
            return self.relationship(custom).map(|r| Some(PropertySpec::Relationship(r)));
        }

        let mut type_name = self.expect_ident()?;
        if *self.peek() == Token::Punct('[') && *self.peek_at(1) == Token::Punct(']') {
            self.advance();
            self.advance();
            type_name.push_str("[]");
        }
        let name = self.expect_ident()?;

        let mut attribute = AttributeSpec::new(name.clone(), type_name.clone());
        attribute.custom = custom;
        attribute.uniform = uniform;

        let value_type = ValueType::parse(&type_name);
        if value_type.is_none() {
            warn!(
                "line {}:{}: skipping `{}` of unsupported type `{}`",
                line, column, name, type_name
            );
        }

        if self.eat_punct('.') {
            let field = self.expect_ident()?;
            self.expect_punct('=')?;
            match field.as_str() {
                "timeSamples" => {
                    let samples = self.time_samples(value_type.as_ref())?;
                    attribute.time_samples = Some(samples);
                }
                "connect" => attribute.connections = self.targets()?,
                other => return Err(self.error(format!("unknown attribute field `.{}`", other))),
            }
        } else if self.eat_punct('=') {
            let (vline, vcol) = (self.current().line, self.current().column);
            let raw = self.value()?;
            if let Some(vt) = &value_type {
                attribute.default = vt
                    .coerce(&raw)
                    .map_err(|e| IoError::parse(vline, vcol, format!("`{}`: {}", name, e)))?;
            }
        }

        if self.eat_punct('(') {
            attribute.metadata = self.metadata_block()?;
        }

        Ok(value_type.map(|_| PropertySpec::Attribute(attribute)))
    }

    fn relationship(&mut self, custom: bool) -> ParseResult<RelationshipSpec> {
        let name = self.expect_ident()?;
        let mut spec = RelationshipSpec {
            name,
            custom,
            targets: Vec::new(),
            metadata: Metadata::new(),
        };
        if self.eat_punct('=') {
            spec.targets = self.targets()?;
        }
        if self.eat_punct('(') {
            spec.metadata = self.metadata_block()?;
        }
        Ok(spec)
    }

    /// A single path, a list of paths, or `None`
    fn targets(&mut self) -> ParseResult<Vec<String>> {
        let raw = self.value()?;
        let items = match raw {
            RawValue::List(items) => items,
            RawValue::Identifier(ref s) if s == "None" => Vec::new(),
            other => vec![other],
        };
        items
            .into_iter()
            .map(|item| match item {
                RawValue::Path(p) => Ok(p),
                other => Err(self.error(format!("expected a target path, found {}", other.describe()))),
            })
            .collect()
    }

    fn time_samples(&mut self, value_type: Option<&ValueType>) -> ParseResult<TimeSamples> {
        let mut samples = TimeSamples::new();
        self.expect_punct('{')?;
        while !self.eat_punct('}') {
            let time = match self.peek() {
                Token::Number { value, .. } => *value,
                _ => return Err(self.unexpected("a time code")),
            };
            self.advance();
            self.expect_punct(':')?;
            let (line, column) = (self.current().line, self.current().column);
            let raw = self.value()?;
            if let Some(vt) = value_type {
                let value = vt
                    .coerce(&raw)
                    .map_err(|e| IoError::parse(line, column, e))?;
                samples.insert(time, value);
            }
            if !self.eat_punct(',') {
                self.expect_punct('}')?;
                break;
            }
        }
        Ok(samples)
    }

    // Metadata

    /// Entries up to the closing `)`; the opening `(` is already consumed
    fn metadata_block(&mut self) -> ParseResult<Metadata> {
        let mut metadata = Metadata::new();
        while !self.eat_punct(')') {
            if self.at_eof() {
                return Err(self.unexpected("`)`"));
            }
            if self.eat_punct(';') {
                continue;
            }
            if let Token::String(doc) = self.peek().clone() {
                self.advance();
                metadata.insert("doc", RawValue::String(doc));
                continue;
            }

            let mut key = self.expect_ident()?;
            if LIST_OPS.contains(&key.as_str()) {
                key = self.expect_ident()?;
            }
            self.expect_punct('=')?;
            let value = self.value()?;
            if COMPOSITION_KEYS.contains(&key.as_str()) {
                debug!("ignoring composition metadata `{}`", key);
                continue;
            }
            metadata.insert(key, value);
        }
        Ok(metadata)
    }

    // Values

    fn value(&mut self) -> ParseResult<RawValue> {
        if matches!(self.peek(), Token::Punct(c) if !"([{".contains(*c)) || self.at_eof() {
            return Err(self.unexpected("a value"));
        }
        let value = match self.advance() {
            Token::Number { value, integral } => RawValue::Number { value, integral },
            Token::String(s) => RawValue::String(s),
            Token::Ident(s) => RawValue::Identifier(s),
            Token::Asset(s) => RawValue::Asset(s),
            Token::Path(s) => RawValue::Path(s),
            Token::Punct('(') => RawValue::Tuple(self.sequence(')')?),
            Token::Punct('[') => RawValue::List(self.sequence(']')?),
            _ => RawValue::Dictionary(self.dictionary()?),
        };
        Ok(value)
    }

    /// Comma-separated values up to `close`; a trailing comma is allowed
    fn sequence(&mut self, close: char) -> ParseResult<Vec<RawValue>> {
        let mut items = Vec::new();
        loop {
            if self.eat_punct(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat_punct(',') {
                self.expect_punct(close)?;
                return Ok(items);
            }
        }
    }

    /// `{ type key = value ... }` entries; the opening brace is consumed
    fn dictionary(&mut self) -> ParseResult<Vec<(String, RawValue)>> {
        let mut entries = Vec::new();
        while !self.eat_punct('}') {
            if self.at_eof() {
                return Err(self.unexpected("`}`"));
            }
            if self.eat_punct(';') || self.eat_punct(',') {
                continue;
            }
            self.expect_ident()?;
            if *self.peek() == Token::Punct('[') {
                self.expect_punct('[')?;
                self.expect_punct(']')?;
            }
            let key = match self.peek().clone() {
                Token::Ident(k) | Token::String(k) => k,
                _ => return Err(self.unexpected("a dictionary key")),
            };
            self.advance();
            self.expect_punct('=')?;
            entries.push((key, self.value()?));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn parse(source: &str) -> Layer {
        Parser::new(source).unwrap().parse_layer().unwrap()
    }

    fn attribute<'a>(prim: &'a PrimSpec, name: &str) -> &'a AttributeSpec {
        prim.properties
            .iter()
            .find_map(|p| match p {
                PropertySpec::Attribute(a) if a.name == name => Some(a),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_layer_metadata_and_prims() {
        let layer = parse(
            r#"#usda 1.0
            (
                "A small test layer"
                upAxis = "Z"
                startTimeCode = 0
                endTimeCode = 48
                customLayerData = { string creator = "hand" }
            )

            def Xform "World" (kind = "assembly")
            {
                def Mesh "Cube" (
                    prepend references = @./cube.usda@
                    active = true
                )
                {
                    int[] faceVertexCounts = [4]
                    custom string MyMaterial = "wood"
                }
                over "Other" {}
            }
            "#,
        );
        assert_eq!(layer.metadata.get("doc"), Some(&RawValue::String("A small test layer".into())));
        assert_eq!(layer.metadata.get("upAxis").and_then(RawValue::as_str), Some("Z"));
        assert!(layer.metadata.get("customLayerData").is_some());

        let world = &layer.root_prims[0];
        assert_eq!(world.type_name.as_deref(), Some("Xform"));
        assert_eq!(world.children.len(), 2);
        let cube = &world.children[0];
        assert!(cube.metadata.get("references").is_none());
        assert_eq!(cube.metadata.get("active").and_then(RawValue::as_bool), Some(true));
        assert_eq!(attribute(cube, "faceVertexCounts").default, Some(Value::IntArray(vec![4])));
        let material = attribute(cube, "MyMaterial");
        assert!(material.custom);
        assert_eq!(material.default, Some(Value::String("wood".into())));
        assert_eq!(world.children[1].specifier, Specifier::Over);
        assert_eq!(world.children[1].type_name, None);
    }

    #[test]
    fn test_time_samples_and_ops() {
        let layer = parse(
            r#"#usda 1.0
            def Xform "Spin" {
                double3 xformOp:translate = (0, 1, 0)
                float xformOp:rotateY.timeSamples = {
                    0: 0,
                    24: 360,
                }
                uniform token[] xformOpOrder = ["xformOp:translate", "xformOp:rotateY"]
                point3f[] points (interpolation = "vertex")
                string label.timeSamples = { 1: "a", 2: None }
            }
            "#,
        );
        let spin = &layer.root_prims[0];
        let rotate = attribute(spin, "xformOp:rotateY");
        let samples = rotate.time_samples.as_ref().unwrap();
        assert_eq!(samples.range(), Some((0.0, 24.0)));
        assert_eq!(samples.evaluate(12.0), Some(Value::Float(180.0)));

        let order = attribute(spin, "xformOpOrder");
        assert!(order.uniform);
        assert_eq!(
            order.default,
            Some(Value::TokenArray(vec!["xformOp:translate".into(), "xformOp:rotateY".into()]))
        );

        let points = attribute(spin, "points");
        assert_eq!(points.default, None);
        assert_eq!(points.metadata.get("interpolation").and_then(RawValue::as_str), Some("vertex"));

        let label = attribute(spin, "label").time_samples.as_ref().unwrap();
        assert_eq!(label.evaluate(5.0), None);
    }

    #[test]
    fn test_relationships_connections_and_skips() {
        let layer = parse(
            r#"#usda 1.0
            def Mesh "M" {
                rel material:binding = </Looks/Wood>
                rel proxyPrim
                color3f inputs:tint.connect = </Looks/Wood.outputs:rgb>
                variantSet "look" = {
                    "red" { color3f[] primvars:displayColor = [(1, 0, 0)] }
                }
                reorder properties = ["a", "b"]
                matrix3d unsupported = ( (1,0,0), (0,1,0), (0,0,1) )
                int answer = 42
            }
            "#,
        );
        let m = &layer.root_prims[0];
        let names: Vec<&str> = m.properties.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["material:binding", "proxyPrim", "inputs:tint", "answer"]);
        match &m.properties[0] {
            PropertySpec::Relationship(r) => assert_eq!(r.targets, vec!["/Looks/Wood".to_string()]),
            other => panic!("expected relationship, got {:?}", other),
        }
        assert_eq!(attribute(m, "inputs:tint").connections, vec!["/Looks/Wood.outputs:rgb".to_string()]);
    }

    #[test]
    fn test_errors_report_position() {
        let err = Parser::new("#usda 1.0\ndef Mesh \"A\" {\n  int x = \"nope\"\n}")
            .unwrap()
            .parse_layer()
            .unwrap_err();
        match err {
            IoError::ParseError { line, column, .. } => assert_eq!((line, column), (3, 11)),
            other => panic!("unexpected error {:?}", other),
        }

        assert!(Parser::new("def Mesh \"A\" {").unwrap().parse_layer().is_err());
        assert!(Parser::new("def Mesh \"1bad\" {}").unwrap().parse_layer().is_err());
    }
}
