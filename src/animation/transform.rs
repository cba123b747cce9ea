use crate::geometry::{Point, Rect, Size};
use crate::style::{Property, Style};

/// 2D transformation derived from an element's animated style.
/// Applied during paint only; layout bounds never include it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation in x and y, percentages already resolved to pixels
    pub translate: (f32, f32),
    /// Scale in x and y (1.0 = no scale)
    pub scale: (f32, f32),
    /// Rotation in radians (clockwise)
    pub rotate: f32,
    /// 3D tilt around the x and y axes in radians (not applied to points)
    pub tilt: (f32, f32),
    /// Transform origin as fraction of size (0.5, 0.5 = center)
    pub origin: (f32, f32),
}

impl Transform {
    /// Identity transform (no transformation)
    pub const IDENTITY: Self = Self {
        translate: (0.0, 0.0),
        scale: (1.0, 1.0),
        rotate: 0.0,
        tilt: (0.0, 0.0),
        origin: (0.5, 0.5),
    };

    /// Create a translation transform
    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            translate: (x, y),
            ..Self::IDENTITY
        }
    }

    /// Create a uniform scale transform
    pub fn scale_uniform(scale: f32) -> Self {
        Self {
            scale: (scale, scale),
            ..Self::IDENTITY
        }
    }

    /// Resolve the transform-related properties of `style` for an element of
    /// `size`. Rotations in the style are degrees.
    pub fn from_style(style: &Style, size: Size) -> Self {
        let scale = style.get(Property::Scale);
        Self {
            translate: (
                style.get(Property::X) + style.get(Property::XPercent) / 100.0 * size.width,
                style.get(Property::Y) + style.get(Property::YPercent) / 100.0 * size.height,
            ),
            scale: (
                scale * style.get(Property::ScaleX),
                scale * style.get(Property::ScaleY),
            ),
            rotate: style.get(Property::Rotation).to_radians(),
            tilt: (
                style.get(Property::RotationX).to_radians(),
                style.get(Property::RotationY).to_radians(),
            ),
            origin: (0.5, 0.5),
        }
    }

    /// Set the transform origin (default is center: 0.5, 0.5)
    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin = (x, y);
        self
    }

    /// Apply this transform to a point relative to a bounding box
    pub fn apply_to_point(&self, x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
        // Calculate origin point
        let origin_x = width * self.origin.0;
        let origin_y = height * self.origin.1;

        // Translate to origin
        let mut tx = x - origin_x;
        let mut ty = y - origin_y;

        // Apply scale
        tx *= self.scale.0;
        ty *= self.scale.1;

        // Apply rotation
        if self.rotate.abs() > 1e-6 {
            let cos = self.rotate.cos();
            let sin = self.rotate.sin();
            let rx = tx * cos - ty * sin;
            let ry = tx * sin + ty * cos;
            tx = rx;
            ty = ry;
        }

        // Translate back from origin
        tx += origin_x;
        ty += origin_y;

        // Apply translation
        tx += self.translate.0;
        ty += self.translate.1;

        (tx, ty)
    }

    /// Center of `bounds` after this transform, in document space.
    pub fn visual_center(&self, bounds: Rect) -> Point {
        let (x, y) = self.apply_to_point(
            bounds.width / 2.0,
            bounds.height / 2.0,
            bounds.width,
            bounds.height,
        );
        Point::new(bounds.x + x, bounds.y + y)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
