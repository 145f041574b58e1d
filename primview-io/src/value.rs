//! Typed attribute values and their conversion from parsed literals

use crate::layer::RawValue;
use nalgebra::{Matrix4, Quaternion, UnitQuaternion};
use primview_core::{Color, Point3f};
use std::fmt;

/// A resolved attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
    Vec4([f64; 4]),
    /// Quaternion stored as `(real, i, j, k)`
    Quat([f64; 4]),
    /// Column-vector convention; literals are transposed on read
    Matrix4(Matrix4<f64>),
    String(String),
    Token(String),
    Asset(String),
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    Vec2Array(Vec<[f64; 2]>),
    Vec3Array(Vec<[f64; 3]>),
    Vec4Array(Vec<[f64; 4]>),
    StringArray(Vec<String>),
    TokenArray(Vec<String>),
}

impl Value {
    /// Short label of the value's shape, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Vec2(_) => "vec2",
            Value::Vec3(_) => "vec3",
            Value::Vec4(_) => "vec4",
            Value::Quat(_) => "quat",
            Value::Matrix4(_) => "matrix4d",
            Value::String(_) => "string",
            Value::Token(_) => "token",
            Value::Asset(_) => "asset",
            Value::BoolArray(_) => "bool[]",
            Value::IntArray(_) => "int[]",
            Value::FloatArray(_) => "float[]",
            Value::Vec2Array(_) => "vec2[]",
            Value::Vec3Array(_) => "vec3[]",
            Value::Vec4Array(_) => "vec4[]",
            Value::StringArray(_) => "string[]",
            Value::TokenArray(_) => "token[]",
        }
    }

    /// Number of elements for arrays
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Value::BoolArray(v) => Some(v.len()),
            Value::IntArray(v) => Some(v.len()),
            Value::FloatArray(v) => Some(v.len()),
            Value::Vec2Array(v) => Some(v.len()),
            Value::Vec3Array(v) => Some(v.len()),
            Value::Vec4Array(v) => Some(v.len()),
            Value::StringArray(v) => Some(v.len()),
            Value::TokenArray(v) => Some(v.len()),
            _ => None,
        }
    }

    /// Linear interpolation towards `other`. Returns `None` for values that
    /// are held rather than blended (text, booleans, integers, mismatched
    /// shapes or array lengths).
    pub fn lerp(&self, other: &Value, t: f64) -> Option<Value> {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => Some(Value::Float(lerp(*a, *b, t))),
            (Value::Vec2(a), Value::Vec2(b)) => Some(Value::Vec2(lerp_n(a, b, t))),
            (Value::Vec3(a), Value::Vec3(b)) => Some(Value::Vec3(lerp_n(a, b, t))),
            (Value::Vec4(a), Value::Vec4(b)) => Some(Value::Vec4(lerp_n(a, b, t))),
            (Value::Quat(a), Value::Quat(b)) => {
                let qa = unit_quaternion(a);
                let qb = unit_quaternion(b);
                let q = qa.try_slerp(&qb, t, 1.0e-9).unwrap_or(qa);
                Some(Value::Quat([q.w, q.i, q.j, q.k]))
            }
            (Value::Matrix4(a), Value::Matrix4(b)) => Some(Value::Matrix4(a + (b - a) * t)),
            (Value::FloatArray(a), Value::FloatArray(b)) if a.len() == b.len() => Some(
                Value::FloatArray(a.iter().zip(b).map(|(x, y)| lerp(*x, *y, t)).collect()),
            ),
            (Value::Vec2Array(a), Value::Vec2Array(b)) if a.len() == b.len() => Some(
                Value::Vec2Array(a.iter().zip(b).map(|(x, y)| lerp_n(x, y, t)).collect()),
            ),
            (Value::Vec3Array(a), Value::Vec3Array(b)) if a.len() == b.len() => Some(
                Value::Vec3Array(a.iter().zip(b).map(|(x, y)| lerp_n(x, y, t)).collect()),
            ),
            (Value::Vec4Array(a), Value::Vec4Array(b)) if a.len() == b.len() => Some(
                Value::Vec4Array(a.iter().zip(b).map(|(x, y)| lerp_n(x, y, t)).collect()),
            ),
            _ => None,
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_n<const N: usize>(a: &[f64; N], b: &[f64; N], t: f64) -> [f64; N] {
    let mut out = [0.0; N];
    for i in 0..N {
        out[i] = lerp(a[i], b[i], t);
    }
    out
}

pub(crate) fn unit_quaternion(q: &[f64; 4]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

const DISPLAY_ARRAY_LIMIT: usize = 8;

fn write_tuple(f: &mut fmt::Formatter<'_>, items: &[f64]) -> fmt::Result {
    write!(f, "(")?;
    for (i, x) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", x)?;
    }
    write!(f, ")")
}

fn write_array<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut item: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    write!(f, "[")?;
    for (i, x) in items.iter().take(DISPLAY_ARRAY_LIMIT).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        item(f, x)?;
    }
    if items.len() > DISPLAY_ARRAY_LIMIT {
        write!(f, ", ... ({} items)", items.len())?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Vec2(v) => write_tuple(f, v),
            Value::Vec3(v) => write_tuple(f, v),
            Value::Vec4(v) | Value::Quat(v) => write_tuple(f, v),
            Value::Matrix4(m) => {
                let rows: Vec<[f64; 4]> = (0..4)
                    .map(|c| [m[(0, c)], m[(1, c)], m[(2, c)], m[(3, c)]])
                    .collect();
                write_array(f, &rows, |f, r| write_tuple(f, r))
            }
            Value::String(s) | Value::Token(s) => write!(f, "{}", s),
            Value::Asset(s) => write!(f, "@{}@", s),
            Value::BoolArray(v) => write_array(f, v, |f, x| write!(f, "{}", x)),
            Value::IntArray(v) => write_array(f, v, |f, x| write!(f, "{}", x)),
            Value::FloatArray(v) => write_array(f, v, |f, x| write!(f, "{}", x)),
            Value::Vec2Array(v) => write_array(f, v, |f, x| write_tuple(f, x)),
            Value::Vec3Array(v) => write_array(f, v, |f, x| write_tuple(f, x)),
            Value::Vec4Array(v) => write_array(f, v, |f, x| write_tuple(f, x)),
            Value::StringArray(v) | Value::TokenArray(v) => {
                write_array(f, v, |f, x| write!(f, "{:?}", x))
            }
        }
    }
}

/// Element kind of a declared attribute type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Vector(usize),
    Quat,
    Matrix4,
    String,
    Token,
    Asset,
}

/// A declared attribute type such as `point3f[]` or `matrix4d`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueType {
    pub kind: ScalarKind,
    pub array: bool,
}

impl ValueType {
    /// Parse a scene type name. Returns `None` for types the viewer does not model.
    pub fn parse(type_name: &str) -> Option<Self> {
        let (base, array) = match type_name.strip_suffix("[]") {
            Some(base) => (base, true),
            None => (type_name, false),
        };

        let kind = match base {
            "bool" => ScalarKind::Bool,
            "int" | "int64" | "uint" | "uint64" | "uchar" => ScalarKind::Int,
            "half" | "float" | "double" | "timecode" => ScalarKind::Float,
            "string" => ScalarKind::String,
            "token" => ScalarKind::Token,
            "asset" => ScalarKind::Asset,
            "matrix4d" => ScalarKind::Matrix4,
            "quath" | "quatf" | "quatd" => ScalarKind::Quat,
            _ => {
                let digits: String = base.chars().filter(|c| c.is_ascii_digit()).collect();
                match digits.parse::<usize>() {
                    Ok(n @ 2..=4) if !base.starts_with("matrix") => ScalarKind::Vector(n),
                    _ => return None,
                }
            }
        };

        Some(Self { kind, array })
    }

    /// Convert a parsed literal into a value of this type.
    ///
    /// `Ok(None)` means the literal was `None`, i.e. a blocked value.
    pub fn coerce(&self, raw: &RawValue) -> Result<Option<Value>, String> {
        if raw.is_none_literal() {
            return Ok(None);
        }

        if !self.array {
            return self.coerce_scalar(raw).map(Some);
        }

        let items = match raw {
            RawValue::List(items) => items,
            other => return Err(format!("expected an array, found {}", other.describe())),
        };

        let value = match self.kind {
            ScalarKind::Bool => Value::BoolArray(collect(items, as_bool)?),
            ScalarKind::Int => Value::IntArray(collect(items, as_int)?),
            ScalarKind::Float => Value::FloatArray(collect(items, as_float)?),
            ScalarKind::Vector(2) => Value::Vec2Array(collect(items, as_tuple::<2>)?),
            ScalarKind::Vector(3) => Value::Vec3Array(collect(items, as_tuple::<3>)?),
            ScalarKind::Vector(_) | ScalarKind::Quat => {
                Value::Vec4Array(collect(items, as_tuple::<4>)?)
            }
            ScalarKind::String | ScalarKind::Asset => {
                Value::StringArray(collect(items, as_text)?)
            }
            ScalarKind::Token => Value::TokenArray(collect(items, as_text)?),
            ScalarKind::Matrix4 => return Err("matrix arrays are not supported".to_string()),
        };
        Ok(Some(value))
    }

    fn coerce_scalar(&self, raw: &RawValue) -> Result<Value, String> {
        Ok(match self.kind {
            ScalarKind::Bool => Value::Bool(as_bool(raw)?),
            ScalarKind::Int => Value::Int(as_int(raw)?),
            ScalarKind::Float => Value::Float(as_float(raw)?),
            ScalarKind::Vector(2) => Value::Vec2(as_tuple::<2>(raw)?),
            ScalarKind::Vector(3) => Value::Vec3(as_tuple::<3>(raw)?),
            ScalarKind::Vector(_) => Value::Vec4(as_tuple::<4>(raw)?),
            ScalarKind::Quat => Value::Quat(as_tuple::<4>(raw)?),
            ScalarKind::Matrix4 => Value::Matrix4(as_matrix(raw)?),
            ScalarKind::String => Value::String(as_text(raw)?),
            ScalarKind::Token => Value::Token(as_text(raw)?),
            ScalarKind::Asset => Value::Asset(as_text(raw)?),
        })
    }
}

fn collect<T>(
    items: &[RawValue],
    convert: impl Fn(&RawValue) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    items.iter().map(convert).collect()
}

fn as_bool(raw: &RawValue) -> Result<bool, String> {
    match raw {
        RawValue::Identifier(s) if s == "true" => Ok(true),
        RawValue::Identifier(s) if s == "false" => Ok(false),
        RawValue::Number { value, .. } if *value == 0.0 || *value == 1.0 => Ok(*value != 0.0),
        other => Err(format!("expected a bool, found {}", other.describe())),
    }
}

fn as_int(raw: &RawValue) -> Result<i64, String> {
    match raw {
        RawValue::Number { value, integral: true } => Ok(*value as i64),
        other => Err(format!("expected an integer, found {}", other.describe())),
    }
}

fn as_float(raw: &RawValue) -> Result<f64, String> {
    raw.as_f64()
        .ok_or_else(|| format!("expected a number, found {}", raw.describe()))
}

fn as_text(raw: &RawValue) -> Result<String, String> {
    match raw {
        RawValue::String(s) | RawValue::Asset(s) | RawValue::Identifier(s) => Ok(s.clone()),
        other => Err(format!("expected a string, found {}", other.describe())),
    }
}

fn as_tuple<const N: usize>(raw: &RawValue) -> Result<[f64; N], String> {
    match raw {
        RawValue::Tuple(items) if items.len() == N => {
            let mut out = [0.0; N];
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = as_float(item)?;
            }
            Ok(out)
        }
        other => Err(format!("expected a {}-tuple, found {}", N, other.describe())),
    }
}

fn as_matrix(raw: &RawValue) -> Result<Matrix4<f64>, String> {
    let rows = match raw {
        RawValue::Tuple(rows) if rows.len() == 4 => rows
            .iter()
            .map(as_tuple::<4>)
            .collect::<Result<Vec<_>, _>>()?,
        other => return Err(format!("expected a 4x4 matrix, found {}", other.describe())),
    };
    // Literals are written for row vectors; transpose into column convention.
    Ok(Matrix4::from_fn(|r, c| rows[c][r]))
}

/// Conversion from a resolved [`Value`] into a concrete Rust type
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) | Value::Token(s) | Value::Asset(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for [f64; 3] {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for Matrix4<f64> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Matrix4(m) => Some(*m),
            _ => None,
        }
    }
}

impl FromValue for Vec<i32> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            // Out-of-range entries become -1 so mesh validation rejects them
            Value::IntArray(v) => Some(v.iter().map(|&i| i32::try_from(i).unwrap_or(-1)).collect()),
            _ => None,
        }
    }
}

impl FromValue for Vec<f64> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::FloatArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec<Point3f> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vec3Array(v) => Some(
                v.iter()
                    .map(|p| Point3f::new(p[0] as f32, p[1] as f32, p[2] as f32))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl FromValue for Vec<Color> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vec3Array(v) => Some(
                v.iter()
                    .map(|c| Color::from_f32([c[0] as f32, c[1] as f32, c[2] as f32]))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl FromValue for Vec<String> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringArray(v) | Value::TokenArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}
