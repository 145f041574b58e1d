//! The loaded scene: a prim tree with typed, time-sampled properties
//!
//! A [`Stage`] flattens a [`Layer`] into an arena of prims indexed by path.
//! [`Prim`], [`Attribute`] and [`Relationship`] are cheap borrowed handles.

use crate::layer::{
    merge_property, AttributeSpec, Layer, Metadata, PrimSpec, PropertySpec, RawValue,
    RelationshipSpec, Specifier,
};
use crate::path::PrimPath;
use crate::time::{TimeCode, TimeSamples};
use crate::value::{FromValue, Value};
use crate::xform::XformOpOrder;
use log::info;
use nalgebra::Matrix4;
use primview_core::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const XFORM_OP_ORDER: &str = "xformOpOrder";

/// Vertical axis declared by a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpAxis::Y => "Y",
            UpAxis::Z => "Z",
        }
    }
}

#[derive(Debug, Clone)]
struct PrimData {
    path: PrimPath,
    specifier: Specifier,
    type_name: Option<String>,
    metadata: Metadata,
    properties: Vec<PropertySpec>,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl PrimData {
    fn pseudo_root() -> Self {
        Self {
            path: PrimPath::root(),
            specifier: Specifier::Def,
            type_name: None,
            metadata: Metadata::new(),
            properties: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    fn merge_properties(&mut self, properties: Vec<PropertySpec>) {
        for property in properties {
            merge_property(&mut self.properties, property);
        }
    }
}

/// A composed scene
#[derive(Debug, Clone)]
pub struct Stage {
    metadata: Metadata,
    prims: Vec<PrimData>,
    index: HashMap<PrimPath, usize>,
    source: Option<PathBuf>,
}

impl Stage {
    /// Open an asset, picking the reader by extension and then by header
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Stage> {
        let path = path.as_ref();
        let stage = crate::registry::ReaderRegistry::with_defaults().read_stage(path)?;
        info!(
            "Opened stage {} ({} prims, up axis {})",
            path.display(),
            stage.prim_count(),
            stage.up_axis().as_str()
        );
        Ok(stage)
    }

    /// Build a stage from a parsed layer. Specs that share a path are merged.
    pub fn from_layer(layer: Layer) -> Self {
        let mut stage = Stage {
            metadata: layer.metadata,
            prims: vec![PrimData::pseudo_root()],
            index: HashMap::new(),
            source: None,
        };
        stage.index.insert(PrimPath::root(), 0);
        for spec in layer.root_prims {
            stage.add_spec(0, spec);
        }
        stage
    }

    fn add_spec(&mut self, parent: usize, spec: PrimSpec) {
        let path = self.prims[parent].path.child(&spec.name);
        let id = match self.index.get(&path) {
            Some(&id) => {
                let data = &mut self.prims[id];
                if spec.specifier != Specifier::Over {
                    data.specifier = spec.specifier;
                }
                if spec.type_name.is_some() {
                    data.type_name = spec.type_name;
                }
                data.metadata.extend(spec.metadata);
                data.merge_properties(spec.properties);
                id
            }
            None => {
                let id = self.prims.len();
                self.prims.push(PrimData {
                    path: path.clone(),
                    specifier: spec.specifier,
                    type_name: spec.type_name,
                    metadata: spec.metadata,
                    properties: spec.properties,
                    parent: Some(parent),
                    children: Vec::new(),
                });
                self.prims[parent].children.push(id);
                self.index.insert(path, id);
                id
            }
        };
        for child in spec.children {
            self.add_spec(id, child);
        }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// File the stage was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn pseudo_root(&self) -> Prim<'_> {
        Prim { stage: self, id: 0 }
    }

    /// Look up a prim by absolute path
    pub fn prim_at(&self, path: &str) -> Option<Prim<'_>> {
        let path = PrimPath::parse(path)?;
        self.index.get(&path).map(|&id| Prim { stage: self, id })
    }

    /// Number of prims below the pseudo-root, including inactive ones
    pub fn prim_count(&self) -> usize {
        self.prims.len() - 1
    }

    /// Depth-first pre-order walk over active, defined, non-abstract prims.
    /// Inactive prims, `class` prims and `over`-only prims are pruned along
    /// with everything beneath them.
    pub fn traverse(&self) -> Traverse<'_> {
        let mut stack = self.prims[0].children.clone();
        stack.reverse();
        Traverse { stage: self, stack }
    }

    pub fn up_axis(&self) -> UpAxis {
        match self.metadata.get("upAxis").and_then(RawValue::as_str) {
            Some("Z") => UpAxis::Z,
            _ => UpAxis::Y,
        }
    }

    pub fn meters_per_unit(&self) -> f64 {
        self.metadata_f64("metersPerUnit").unwrap_or(0.01)
    }

    pub fn start_time_code(&self) -> Option<f64> {
        self.metadata_f64("startTimeCode")
    }

    pub fn end_time_code(&self) -> Option<f64> {
        self.metadata_f64("endTimeCode")
    }

    pub fn time_codes_per_second(&self) -> f64 {
        self.metadata_f64("timeCodesPerSecond").unwrap_or(24.0)
    }

    pub fn default_prim(&self) -> Option<Prim<'_>> {
        let name = self.metadata.get("defaultPrim")?.as_str()?;
        self.prim_at(&PrimPath::root().child(name).to_string())
    }

    pub fn doc(&self) -> Option<&str> {
        self.metadata.get("doc").and_then(RawValue::as_str)
    }

    fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(RawValue::as_f64)
    }
}

/// Iterator returned by [`Stage::traverse`]
pub struct Traverse<'a> {
    stage: &'a Stage,
    stack: Vec<usize>,
}

impl<'a> Iterator for Traverse<'a> {
    type Item = Prim<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let prim = Prim { stage: self.stage, id };
            if !prim.is_active() || prim.specifier() != Specifier::Def {
                continue;
            }
            self.stack
                .extend(self.stage.prims[id].children.iter().rev().copied());
            return Some(prim);
        }
        None
    }
}

/// Handle to a prim on a [`Stage`]
#[derive(Clone, Copy)]
pub struct Prim<'a> {
    stage: &'a Stage,
    id: usize,
}

impl<'a> Prim<'a> {
    fn data(&self) -> &'a PrimData {
        &self.stage.prims[self.id]
    }

    pub fn stage(&self) -> &'a Stage {
        self.stage
    }

    pub fn path(&self) -> &'a PrimPath {
        &self.data().path
    }

    pub fn name(&self) -> &'a str {
        self.data().path.name()
    }

    pub fn is_pseudo_root(&self) -> bool {
        self.id == 0
    }

    /// Schema type, empty for typeless prims
    pub fn type_name(&self) -> &'a str {
        self.data().type_name.as_deref().unwrap_or("")
    }

    pub fn is_a(&self, type_name: &str) -> bool {
        self.type_name() == type_name
    }

    pub fn specifier(&self) -> Specifier {
        self.data().specifier
    }

    pub fn metadata(&self) -> &'a Metadata {
        &self.data().metadata
    }

    /// `active = false` deactivates a prim and its subtree
    pub fn is_active(&self) -> bool {
        self.metadata()
            .get("active")
            .and_then(RawValue::as_bool)
            .unwrap_or(true)
    }

    pub fn kind(&self) -> Option<&'a str> {
        self.metadata().get("kind").and_then(RawValue::as_str)
    }

    pub fn parent(&self) -> Option<Prim<'a>> {
        self.data().parent.map(|id| Prim { stage: self.stage, id })
    }

    pub fn children(&self) -> impl Iterator<Item = Prim<'a>> + 'a {
        let stage = self.stage;
        self.data()
            .children
            .iter()
            .map(move |&id| Prim { stage, id })
    }

    /// Properties in declaration order
    pub fn properties(&self) -> impl Iterator<Item = Property<'a>> + 'a {
        let prim = *self;
        self.data()
            .properties
            .iter()
            .map(move |spec| Property::new(prim, spec))
    }

    pub fn property(&self, name: &str) -> Option<Property<'a>> {
        let prim = *self;
        self.data()
            .properties
            .iter()
            .find(|p| p.name() == name)
            .map(|spec| Property::new(prim, spec))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn attribute(&self, name: &str) -> Option<Attribute<'a>> {
        match self.property(name)? {
            Property::Attribute(a) => Some(a),
            Property::Relationship(_) => None,
        }
    }

    pub fn relationship(&self, name: &str) -> Option<Relationship<'a>> {
        match self.property(name)? {
            Property::Relationship(r) => Some(r),
            Property::Attribute(_) => None,
        }
    }

    /// The prim's parsed `xformOpOrder`, empty when it has none
    pub fn xform_op_order(&self) -> Result<XformOpOrder> {
        let entries: Vec<String> = match self.attribute(XFORM_OP_ORDER) {
            Some(attr) => attr.get_as(TimeCode::Default).unwrap_or_default(),
            None => Vec::new(),
        };
        XformOpOrder::parse(&entries).map_err(|e| self.scene_error(e))
    }

    /// Local transform at `time`, in column-vector convention
    pub fn local_transform(&self, time: TimeCode) -> Result<Matrix4<f64>> {
        let order = self.xform_op_order()?;
        order
            .evaluate(|name| self.attribute(name)?.get(time))
            .map_err(|e| self.scene_error(e))
    }

    /// Product of the local transforms from the outermost ancestor down to
    /// this prim. `!resetXformStack!` stops the walk at the prim that holds it.
    pub fn local_to_world(&self, time: TimeCode) -> Result<Matrix4<f64>> {
        let mut world = Matrix4::identity();
        let mut current = Some(*self);
        while let Some(prim) = current {
            if prim.is_pseudo_root() {
                break;
            }
            let order = prim.xform_op_order()?;
            let local = order
                .evaluate(|name| prim.attribute(name)?.get(time))
                .map_err(|e| prim.scene_error(e))?;
            world = local * world;
            if order.resets_stack {
                break;
            }
            current = prim.parent();
        }
        Ok(world)
    }

    /// Number of prims in the subtree below this one
    pub fn descendant_count(&self) -> usize {
        self.children().map(|c| 1 + c.descendant_count()).sum()
    }

    fn scene_error(&self, message: String) -> Error {
        Error::Scene(format!("{}: {}", self.path(), message))
    }
}

impl std::fmt::Debug for Prim<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prim")
            .field("path", self.path())
            .field("type", &self.type_name())
            .finish()
    }
}

/// A property handle: either an attribute or a relationship
#[derive(Debug, Clone, Copy)]
pub enum Property<'a> {
    Attribute(Attribute<'a>),
    Relationship(Relationship<'a>),
}

impl<'a> Property<'a> {
    fn new(prim: Prim<'a>, spec: &'a PropertySpec) -> Self {
        match spec {
            PropertySpec::Attribute(spec) => Property::Attribute(Attribute { prim, spec }),
            PropertySpec::Relationship(spec) => Property::Relationship(Relationship { prim, spec }),
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Property::Attribute(a) => a.name(),
            Property::Relationship(r) => r.name(),
        }
    }

    pub fn prim(&self) -> Prim<'a> {
        match self {
            Property::Attribute(a) => a.prim,
            Property::Relationship(r) => r.prim,
        }
    }

    /// Human-readable value at `time`: the attribute value, or the
    /// relationship targets. Empty when there is nothing to show.
    pub fn display_value(&self, time: TimeCode) -> String {
        match self {
            Property::Attribute(a) => a.get(time).map(|v| v.to_string()).unwrap_or_default(),
            Property::Relationship(r) => r.targets().join(", "),
        }
    }
}

/// Handle to an attribute on a prim
#[derive(Clone, Copy)]
pub struct Attribute<'a> {
    prim: Prim<'a>,
    spec: &'a AttributeSpec,
}

impl<'a> Attribute<'a> {
    pub fn name(&self) -> &'a str {
        &self.spec.name
    }

    pub fn prim(&self) -> Prim<'a> {
        self.prim
    }

    /// Declared type such as `point3f[]`
    pub fn type_name(&self) -> &'a str {
        &self.spec.type_name
    }

    pub fn is_custom(&self) -> bool {
        self.spec.custom
    }

    pub fn is_uniform(&self) -> bool {
        self.spec.uniform
    }

    pub fn metadata(&self) -> &'a Metadata {
        &self.spec.metadata
    }

    /// Primvar interpolation such as `vertex` or `constant`
    pub fn interpolation(&self) -> Option<&'a str> {
        self.spec.metadata.get("interpolation").and_then(RawValue::as_str)
    }

    pub fn connections(&self) -> &'a [String] {
        &self.spec.connections
    }

    pub fn time_samples(&self) -> Option<&'a TimeSamples> {
        self.spec.time_samples.as_ref().filter(|s| !s.is_empty())
    }

    pub fn is_time_varying(&self) -> bool {
        self.time_samples().is_some_and(|s| s.len() > 1)
    }

    /// Resolve the value at `time`. Time samples win over the default unless
    /// the default time code is requested.
    pub fn get(&self, time: TimeCode) -> Option<Value> {
        match (time, self.time_samples()) {
            (TimeCode::At(t), Some(samples)) => samples.evaluate(t),
            (TimeCode::Default, _) | (_, None) => self.spec.default.clone(),
        }
    }

    /// Resolve and convert; `None` when unset, blocked or of another type
    pub fn get_as<T: FromValue>(&self, time: TimeCode) -> Option<T> {
        self.get(time).as_ref().and_then(T::from_value)
    }
}

impl std::fmt::Debug for Attribute<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("prim", self.prim.path())
            .field("name", &self.spec.name)
            .field("type", &self.spec.type_name)
            .finish()
    }
}

/// Handle to a relationship on a prim
#[derive(Clone, Copy)]
pub struct Relationship<'a> {
    prim: Prim<'a>,
    spec: &'a RelationshipSpec,
}

impl<'a> Relationship<'a> {
    pub fn name(&self) -> &'a str {
        &self.spec.name
    }

    pub fn prim(&self) -> Prim<'a> {
        self.prim
    }

    pub fn targets(&self) -> &'a [String] {
        &self.spec.targets
    }

    pub fn is_custom(&self) -> bool {
        self.spec.custom
    }
}

impl std::fmt::Debug for Relationship<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relationship")
            .field("prim", self.prim.path())
            .field("name", &self.spec.name)
            .field("targets", &self.spec.targets)
            .finish()
    }
}
