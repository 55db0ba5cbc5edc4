//! 2D affine transforms in row-vector form.
//!
//! A point maps as `x' = a*x + c*y + tx`, `y' = b*x + d*y + ty`, and
//! `t1.concatenating(t2)` applies `t1` first, then `t2`.

use crate::shared::geometry::{Point, Rect, Size};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

/// Determinants below this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    /// `self` followed by `next`.
    pub fn concatenating(&self, next: &AffineTransform) -> Self {
        Self {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            tx: self.tx * next.a + self.ty * next.c + next.tx,
            ty: self.tx * next.b + self.ty * next.d + next.ty,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn inverted(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            tx: (self.c * self.ty - self.d * self.tx) * inv,
            ty: (self.b * self.tx - self.a * self.ty) * inv,
        })
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Axis-aligned bounds of `size` (anchored at the origin) after transforming.
    pub fn bounds_of(&self, size: Size) -> Rect {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(size.width, 0.0),
            Point::new(0.0, size.height),
            Point::new(size.width, size.height),
        ]
        .map(|p| self.apply(p));
        Rect::bounding(&corners).unwrap_or_default()
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Places an overlay of `natural_size` onto a face.
///
/// Order is fixed: scale the overlay to the face box (each axis
/// independently), rotate about the overlay origin by the negated face
/// angle, then translate to the box origin. The detector's positive angle
/// runs opposite to the transform's rotation direction, hence the negation.
pub fn overlay_transform(face_bounds: &Rect, angle_degrees: f64, natural_size: Size) -> AffineTransform {
    let scale = AffineTransform::scale(
        face_bounds.width / natural_size.width,
        face_bounds.height / natural_size.height,
    );
    let rotation = AffineTransform::rotation(-angle_degrees.to_radians());
    let translation = AffineTransform::translation(face_bounds.x, face_bounds.y);

    AffineTransform::IDENTITY
        .concatenating(&scale)
        .concatenating(&rotation)
        .concatenating(&translation)
}
