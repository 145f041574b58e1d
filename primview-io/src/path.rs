//! Absolute prim paths such as `/World/Geom/Cube`

use std::fmt;

/// An absolute path to a prim. The pseudo-root is `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimPath(String);

impl PrimPath {
    /// The pseudo-root path `/`
    pub fn root() -> Self {
        PrimPath("/".to_string())
    }

    /// Parse an absolute prim path, rejecting property paths and empty elements
    pub fn parse(text: &str) -> Option<Self> {
        if text == "/" {
            return Some(Self::root());
        }
        let rest = text.strip_prefix('/')?;
        if rest.split('/').all(is_valid_name) {
            Some(PrimPath(text.to_string()))
        } else {
            None
        }
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path of a child prim
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            PrimPath(format!("/{}", name))
        } else {
            PrimPath(format!("{}/{}", self.0, name))
        }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(i) => Some(PrimPath(self.0[..i].to_string())),
            None => None,
        }
    }

    /// Last path element; empty for the pseudo-root
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Number of elements below the pseudo-root
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches('/').count()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of a property on this prim, e.g. `/World/Cube.points`
    pub fn property(&self, name: &str) -> String {
        format!("{}.{}", self.0, name)
    }
}

/// Prim names are identifiers: a letter or underscore followed by
/// letters, digits or underscores
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl fmt::Display for PrimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PrimPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
