//! Sub-pixel geometry primitives

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::{GeometryError, GeometryResult};

/// Sub-pixel screen coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a point, rejecting NaN and infinite components
    pub fn try_new(x: f64, y: f64) -> GeometryResult<Self> {
        let point = Self { x, y };
        point.validate()?;
        Ok(point)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Ensure both components are finite
    pub fn validate(&self) -> GeometryResult<()> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(GeometryError::InvalidCoordinate {
                x: self.x,
                y: self.y,
            })
        }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other - *self).length()
    }

    /// Linear interpolation, `t = 0` is `self`
    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point {
            x: (other.x - self.x).mul_add(t, self.x),
            y: (other.y - self.y).mul_add(t, self.y),
        }
    }

    /// Round to the integer pixel grid the OS reports
    pub fn rounded(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Displacement between two points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
}

impl Vector {
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn length(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    /// Unit vector in the same direction, `None` for the zero vector
    pub fn normalized(&self) -> Option<Vector> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(Vector::new(self.dx / len, self.dy / len))
    }

    /// Counter-clockwise perpendicular of the same length
    pub fn perpendicular(&self) -> Vector {
        Vector::new(-self.dy, self.dx)
    }

    pub fn scale(&self, factor: f64) -> Vector {
        Vector::new(self.dx * factor, self.dy * factor)
    }

    pub fn dot(&self, other: Vector) -> f64 {
        self.dx.mul_add(other.dx, self.dy * other.dy)
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Smallest box containing every point, `None` for an empty set
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |bbox, p| bbox.including(p)))
    }

    pub fn including(&self, p: Point) -> Self {
        Self {
            min: Point::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Point::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: Point::new(self.min.x - margin, self.min.y - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn contains(&self, p: Point, tolerance: f64) -> bool {
        p.x >= self.min.x - tolerance
            && p.x <= self.max.x + tolerance
            && p.y >= self.min.y - tolerance
            && p.y <= self.max.y + tolerance
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.min.lerp(self.max, 0.5)
    }
}
