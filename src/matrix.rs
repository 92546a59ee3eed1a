use glam::{DAffine2, DVec2};

/// 2d affine transform, composed the way a canvas context composes it:
/// every new operation applies in the local frame of the previous ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub affine: DAffine2,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        affine: DAffine2::IDENTITY,
    };

    pub fn new(affine: DAffine2) -> Self {
        Self { affine }
    }

    pub fn translate(&mut self, offset: DVec2) {
        self.affine = self.affine * DAffine2::from_translation(offset);
    }

    /// angle in radians
    pub fn rotate(&mut self, angle: f64) {
        self.affine = self.affine * DAffine2::from_angle(angle);
    }

    pub fn scale(&mut self, scale: DVec2) {
        self.affine = self.affine * DAffine2::from_scale(scale);
    }

    pub fn apply(&self, p: DVec2) -> DVec2 {
        self.affine.transform_point2(p)
    }

    pub fn apply_vector(&self, v: DVec2) -> DVec2 {
        self.affine.transform_vector2(v)
    }

    /// Average linear scale, used to convert line widths to device pixels.
    pub fn scale_factor(&self) -> f64 {
        self.affine.matrix2.determinant().abs().sqrt()
    }

    pub fn inverse(&self) -> Option<Transform> {
        if self.affine.matrix2.determinant().abs() < f64::EPSILON {
            return None;
        }
        Some(Transform::new(self.affine.inverse()))
    }
}

pub fn rotate_around(point: DVec2, center: DVec2, angle: f64) -> DVec2 {
    center + DVec2::from_angle(angle).rotate(point - center)
}
