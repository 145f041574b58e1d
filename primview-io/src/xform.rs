//! Transform operation stacks (`xformOpOrder`) and their evaluation
//!
//! Ops are listed outermost first: the last op in the order touches points
//! first. In column-vector convention the local matrix is
//! `op_1 * op_2 * ... * op_n`.

use crate::value::{unit_quaternion, Value};
use nalgebra::{Matrix4, Rotation3, Vector3};

/// Token that discards all ancestor transforms when it leads an op order
pub const RESET_XFORM_STACK: &str = "!resetXformStack!";

const INVERT_PREFIX: &str = "!invert!";
const OP_NAMESPACE: &str = "xformOp:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    fn unit(self) -> nalgebra::Unit<Vector3<f64>> {
        match self {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        }
    }

    fn component(self, v: &[f64; 3]) -> f64 {
        match self {
            Axis::X => v[0],
            Axis::Y => v[1],
            Axis::Z => v[2],
        }
    }
}

/// Kind of a single transform operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XformOpType {
    Translate,
    Scale,
    Rotate(Axis),
    /// Three-axis rotation; the first axis is applied first
    RotateEuler([Axis; 3]),
    Orient,
    Transform,
}

impl XformOpType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "translate" => return Some(XformOpType::Translate),
            "scale" => return Some(XformOpType::Scale),
            "orient" => return Some(XformOpType::Orient),
            "transform" => return Some(XformOpType::Transform),
            _ => {}
        }
        let axes: Vec<Axis> = name
            .strip_prefix("rotate")?
            .chars()
            .map(Axis::from_char)
            .collect::<Option<_>>()?;
        match axes.as_slice() {
            [a] => Some(XformOpType::Rotate(*a)),
            [a, b, c] if a != b && b != c && a != c => Some(XformOpType::RotateEuler([*a, *b, *c])),
            _ => None,
        }
    }
}

/// One entry of an op order, bound to the attribute that stores its value
#[derive(Debug, Clone, PartialEq)]
pub struct XformOp {
    pub op_type: XformOpType,
    pub attribute_name: String,
    pub inverse: bool,
}

impl XformOp {
    /// Parse an entry such as `xformOp:rotateXYZ` or `!invert!xformOp:translate:pivot`
    pub fn parse(entry: &str) -> Result<Self, String> {
        let (inverse, attribute_name) = match entry.strip_prefix(INVERT_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, entry),
        };
        let op_name = attribute_name
            .strip_prefix(OP_NAMESPACE)
            .ok_or_else(|| format!("`{}` is not in the xformOp namespace", entry))?;
        let type_name = op_name.split(':').next().unwrap_or(op_name);
        let op_type = XformOpType::parse(type_name)
            .ok_or_else(|| format!("unknown transform op `{}`", type_name))?;

        Ok(Self {
            op_type,
            attribute_name: attribute_name.to_string(),
            inverse,
        })
    }

    /// Matrix of this op for a resolved attribute value
    pub fn matrix(&self, value: &Value) -> Result<Matrix4<f64>, String> {
        let m = match (self.op_type, value) {
            (XformOpType::Translate, Value::Vec3(t)) => {
                Matrix4::new_translation(&Vector3::from(*t))
            }
            (XformOpType::Scale, Value::Vec3(s)) => {
                Matrix4::new_nonuniform_scaling(&Vector3::from(*s))
            }
            (XformOpType::Scale, Value::Float(s)) => Matrix4::new_scaling(*s),
            (XformOpType::Rotate(axis), Value::Float(deg)) => rotation(axis, *deg),
            (XformOpType::RotateEuler(axes), Value::Vec3(angles)) => axes
                .iter()
                .fold(Matrix4::identity(), |acc, &axis| {
                    rotation(axis, axis.component(angles)) * acc
                }),
            (XformOpType::Orient, Value::Quat(q)) => unit_quaternion(q).to_homogeneous(),
            (XformOpType::Transform, Value::Matrix4(m)) => *m,
            (op, value) => {
                return Err(format!(
                    "`{}` ({:?}) cannot use a {} value",
                    self.attribute_name,
                    op,
                    value.kind_name()
                ))
            }
        };

        if self.inverse {
            m.try_inverse()
                .ok_or_else(|| format!("`{}` is not invertible", self.attribute_name))
        } else {
            Ok(m)
        }
    }
}

fn rotation(axis: Axis, degrees: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&axis.unit(), degrees.to_radians()).to_homogeneous()
}

/// A parsed `xformOpOrder`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XformOpOrder {
    pub resets_stack: bool,
    pub ops: Vec<XformOp>,
}

impl XformOpOrder {
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, String> {
        let mut order = XformOpOrder::default();
        for (i, entry) in entries.iter().enumerate() {
            let entry = entry.as_ref();
            if entry == RESET_XFORM_STACK {
                if i != 0 {
                    return Err(format!("{} must be the first op", RESET_XFORM_STACK));
                }
                order.resets_stack = true;
                continue;
            }
            order.ops.push(XformOp::parse(entry)?);
        }
        Ok(order)
    }

    /// Compose the local matrix, resolving each op's value through `lookup`
    pub fn evaluate(
        &self,
        mut lookup: impl FnMut(&str) -> Option<Value>,
    ) -> Result<Matrix4<f64>, String> {
        let mut local = Matrix4::identity();
        for op in &self.ops {
            let value = lookup(&op.attribute_name)
                .ok_or_else(|| format!("`{}` has no value", op.attribute_name))?;
            local *= op.matrix(&value)?;
        }
        Ok(local)
    }
}
