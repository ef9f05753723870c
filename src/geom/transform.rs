use super::{Point, Rect};

/// A 2D affine transformation stored as six doubles.
///
/// Element order follows the classic AGG convention, which is also the
/// order used by the flat icon format: with elements `m0..m5`, a point maps
/// as `(x', y') = (m0·x + m2·y + m4, m1·x + m3·y + m5)`.
///
/// `multiply` composes in application order: `a.multiply(&b)` yields the
/// transform that applies `a` first, then `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub sx: f64,
    pub shy: f64,
    pub shx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The number of stored matrix elements.
    pub const MATRIX_SIZE: usize = 6;

    pub const fn identity() -> Self {
        Self { sx: 1.0, shy: 0.0, shx: 0.0, sy: 1.0, tx: 0.0, ty: 0.0 }
    }

    pub const fn translation(dx: f64, dy: f64) -> Self {
        Self { sx: 1.0, shy: 0.0, shx: 0.0, sy: 1.0, tx: dx, ty: dy }
    }

    pub fn rotation(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { sx: cos, shy: sin, shx: -sin, sy: cos, tx: 0.0, ty: 0.0 }
    }

    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self { sx, shy: 0.0, shx: 0.0, sy, tx: 0.0, ty: 0.0 }
    }

    pub fn skewing(x: f64, y: f64) -> Self {
        Self { sx: 1.0, shy: y.tan(), shx: x.tan(), sy: 1.0, tx: 0.0, ty: 0.0 }
    }

    /// Loads the matrix from its six-element storage form.
    pub fn from_elements(m: &[f64; 6]) -> Self {
        Self { sx: m[0], shy: m[1], shx: m[2], sy: m[3], tx: m[4], ty: m[5] }
    }

    /// Stores the matrix into its six-element form.
    pub fn store_to(&self, m: &mut [f64; 6]) {
        *m = [self.sx, self.shy, self.shx, self.sy, self.tx, self.ty];
    }

    pub fn elements(&self) -> [f64; 6] {
        [self.sx, self.shy, self.shx, self.sy, self.tx, self.ty]
    }

    /// Composes `self` with `other` so that `self` applies first.
    pub fn multiply(&mut self, other: &Transform) -> &mut Self {
        let t0 = self.sx * other.sx + self.shy * other.shx;
        let t2 = self.shx * other.sx + self.sy * other.shx;
        let t4 = self.tx * other.sx + self.ty * other.shx + other.tx;
        self.shy = self.sx * other.shy + self.shy * other.sy;
        self.sy = self.shx * other.shy + self.sy * other.sy;
        self.ty = self.tx * other.shy + self.ty * other.sy + other.ty;
        self.sx = t0;
        self.shx = t2;
        self.tx = t4;
        self
    }

    /// Returns the composition of `self` then `other` without mutating.
    pub fn multiplied(&self, other: &Transform) -> Transform {
        let mut result = *self;
        result.multiply(other);
        result
    }

    pub fn determinant(&self) -> f64 {
        self.sx * self.sy - self.shy * self.shx
    }

    /// Inverts the matrix in place. The matrix must be valid
    /// (`determinant() != 0`).
    pub fn invert(&mut self) -> &mut Self {
        let d = 1.0 / self.determinant();
        let t0 = self.sy * d;
        self.sy = self.sx * d;
        self.shy = -self.shy * d;
        self.shx = -self.shx * d;
        let t4 = -self.tx * t0 - self.ty * self.shx;
        self.ty = -self.tx * self.shy - self.ty * self.sy;
        self.sx = t0;
        self.tx = t4;
        self
    }

    pub fn inverted(&self) -> Transform {
        let mut result = *self;
        result.invert();
        result
    }

    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    // --- Pivot-relative editing operations ---

    pub fn translate_by(&mut self, offset: Point) {
        if offset.x != 0.0 || offset.y != 0.0 {
            self.multiply(&Transform::translation(offset.x, offset.y));
        }
    }

    pub fn rotate_by(&mut self, pivot: Point, degrees: f64) {
        if degrees != 0.0 {
            self.multiply(&Transform::translation(-pivot.x, -pivot.y));
            self.multiply(&Transform::rotation(degrees.to_radians()));
            self.multiply(&Transform::translation(pivot.x, pivot.y));
        }
    }

    pub fn scale_by(&mut self, pivot: Point, x_scale: f64, y_scale: f64) {
        if x_scale != 1.0 || y_scale != 1.0 {
            self.multiply(&Transform::translation(-pivot.x, -pivot.y));
            self.multiply(&Transform::scaling(x_scale, y_scale));
            self.multiply(&Transform::translation(pivot.x, pivot.y));
        }
    }

    pub fn shear_by(&mut self, pivot: Point, x_shear: f64, y_shear: f64) {
        if x_shear != 0.0 || y_shear != 0.0 {
            self.multiply(&Transform::translation(-pivot.x, -pivot.y));
            self.multiply(&Transform::skewing(x_shear, y_shear));
            self.multiply(&Transform::translation(pivot.x, pivot.y));
        }
    }

    // --- Predicates ---

    pub fn is_identity(&self) -> bool {
        self.sx == 1.0
            && self.shy == 0.0
            && self.shx == 0.0
            && self.sy == 1.0
            && self.tx == 0.0
            && self.ty == 0.0
    }

    pub fn is_translation_only(&self) -> bool {
        self.sx == 1.0 && self.shy == 0.0 && self.shx == 0.0 && self.sy == 1.0
    }

    /// True when x and y are scaled uniformly.
    pub fn is_not_distorted(&self) -> bool {
        self.sx == self.sy
    }

    pub fn is_valid(&self) -> bool {
        self.determinant() != 0.0
    }

    /// The average scale factor, used for level-of-detail decisions and
    /// curve flattening tolerance.
    pub fn scale(&self) -> f64 {
        let x = 0.707106781 * self.sx + 0.707106781 * self.shx;
        let y = 0.707106781 * self.shy + 0.707106781 * self.sy;
        (x * x + y * y).sqrt()
    }

    // --- Application ---

    pub fn transform(&self, x: &mut f64, y: &mut f64) {
        let tmp = *x;
        *x = tmp * self.sx + *y * self.shx + self.tx;
        *y = tmp * self.shy + *y * self.sy + self.ty;
    }

    pub fn transform_point(&self, point: &Point) -> Point {
        let mut x = point.x;
        let mut y = point.y;
        self.transform(&mut x, &mut y);
        Point::new(x, y)
    }

    pub fn inverse_transform(&self, x: &mut f64, y: &mut f64) {
        self.inverted().transform(x, y);
    }

    /// Transforms the four corners of `bounds` and returns the axis-aligned
    /// bounding box of the result, expanded outward to whole units.
    pub fn transform_bounds(&self, bounds: &Rect) -> Rect {
        if !bounds.is_valid() {
            return *bounds;
        }
        let corners = [
            self.transform_point(&Point::new(bounds.left, bounds.top)),
            self.transform_point(&Point::new(bounds.right, bounds.top)),
            self.transform_point(&Point::new(bounds.left, bounds.bottom)),
            self.transform_point(&Point::new(bounds.right, bounds.bottom)),
        ];
        let mut result = Rect::invalid();
        for corner in &corners {
            result.include(corner);
        }
        Rect {
            left: result.left.floor(),
            top: result.top.floor(),
            right: result.right.ceil(),
            bottom: result.bottom.ceil(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_applies_in_order() {
        // Scale by 2, then translate by (10, 0).
        let mut t = Transform::scaling(2.0, 2.0);
        t.multiply(&Transform::translation(10.0, 0.0));
        let p = t.transform_point(&Point::new(1.0, 1.0));
        assert_eq!(p, Point::new(12.0, 2.0));
    }

    #[test]
    fn invert_round_trips() {
        let mut t = Transform::identity();
        t.rotate_by(Point::new(32.0, 32.0), 30.0);
        t.scale_by(Point::ORIGIN, 1.5, 0.75);
        let inv = t.inverted();
        let p = Point::new(5.0, -3.0);
        let back = inv.transform_point(&t.transform_point(&p));
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn predicates() {
        assert!(Transform::identity().is_identity());
        assert!(Transform::translation(3.0, 4.0).is_translation_only());
        assert!(!Transform::translation(3.0, 4.0).is_identity());
        assert!(Transform::scaling(2.0, 2.0).is_not_distorted());
        assert!(!Transform::scaling(2.0, 1.0).is_not_distorted());
        assert!(!Transform::scaling(0.0, 1.0).is_valid());
    }
}
