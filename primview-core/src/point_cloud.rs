//! Point cloud container

use crate::point::*;
use crate::transform::Transform3D;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A generic point cloud container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with 3D points
pub type PointCloud3f = PointCloud<Point3f>;

/// A point cloud with colored points
pub type ColoredPointCloud3f = PointCloud<ColoredPoint3f>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

impl PointCloud<Point3f> {
    /// Attach one color to every point
    pub fn with_uniform_color(&self, color: Color) -> ColoredPointCloud3f {
        self.iter()
            .map(|&position| ColoredPoint3f { position, color })
            .collect()
    }

    /// Attach per-point colors. A single color is broadcast; any other length
    /// mismatch falls back to `fallback`.
    pub fn with_colors(&self, colors: &[Color], fallback: Color) -> ColoredPointCloud3f {
        match colors.len() {
            1 => self.with_uniform_color(colors[0]),
            n if n == self.len() => self
                .iter()
                .zip(colors)
                .map(|(&position, &color)| ColoredPoint3f { position, color })
                .collect(),
            _ => self.with_uniform_color(fallback),
        }
    }

    /// Return a copy with a transformation applied to every point
    pub fn transformed(&self, transform: &Transform3D) -> Self {
        self.iter().map(|p| transform.transform_point(p)).collect()
    }
}
