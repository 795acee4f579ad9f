//! Corner-form boxes and overlap measures.

/// Axis-aligned box in `(y_min, x_min, y_max, x_max)` order.
///
/// Coordinates are normalized `[0, 1]` right after decoding and pixels after
/// filtering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCorners {
    pub y_min: f32,
    pub x_min: f32,
    pub y_max: f32,
    pub x_max: f32,
}

impl BoxCorners {
    /// Creates a box from explicit corners.
    pub fn new(y_min: f32, x_min: f32, y_max: f32, x_max: f32) -> Self {
        Self {
            y_min,
            x_min,
            y_max,
            x_max,
        }
    }

    /// Builds a box from center `(x, y)` and size `(w, h)`.
    pub fn from_center_size(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            y_min: cy - h / 2.0,
            x_min: cx - w / 2.0,
            y_max: cy + h / 2.0,
            x_max: cx + w / 2.0,
        }
    }

    /// Center as `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Size as `(w, h)`.
    pub fn size(&self) -> (f32, f32) {
        (self.x_max - self.x_min, self.y_max - self.y_min)
    }

    /// Area, zero for inverted or empty boxes.
    pub fn area(&self) -> f32 {
        let (w, h) = self.size();
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Returns the box with corners ordered so that min <= max.
    pub fn normalized(&self) -> Self {
        Self {
            y_min: self.y_min.min(self.y_max),
            x_min: self.x_min.min(self.x_max),
            y_max: self.y_min.max(self.y_max),
            x_max: self.x_min.max(self.x_max),
        }
    }

    /// Multiplies y by `height` and x by `width`.
    pub fn scale(&self, height: f32, width: f32) -> Self {
        Self {
            y_min: self.y_min * height,
            x_min: self.x_min * width,
            y_max: self.y_max * height,
            x_max: self.x_max * width,
        }
    }

    /// True when all corners are finite and the box has positive extent.
    pub fn is_valid(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
            && self.y_max > self.y_min
            && self.x_max > self.x_min
    }

    /// Corners as `[y_min, x_min, y_max, x_max]`.
    pub fn to_array(&self) -> [f32; 4] {
        [self.y_min, self.x_min, self.y_max, self.x_max]
    }

    /// Intersection over union; corners may be given in either order.
    ///
    /// Returns 0 when either box has no area.
    pub fn iou(&self, other: &BoxCorners) -> f32 {
        let a = self.normalized();
        let b = other.normalized();
        let area_a = a.area();
        let area_b = b.area();
        if area_a <= 0.0 || area_b <= 0.0 {
            return 0.0;
        }
        let inter = BoxCorners {
            y_min: a.y_min.max(b.y_min),
            x_min: a.x_min.max(b.x_min),
            y_max: a.y_max.min(b.y_max),
            x_max: a.x_max.min(b.x_max),
        }
        .area();
        inter / (area_a + area_b - inter)
    }
}

impl From<[f32; 4]> for BoxCorners {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}
