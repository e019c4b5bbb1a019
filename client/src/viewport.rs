use stratboard_shared::Point;

pub const MIN_SCALE: f64 = 0.01;
pub const MAX_SCALE: f64 = 100.0;
pub const ZOOM_STEP: f64 = 0.1;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ViewportError {
    #[error("zoom factor {0} must be finite and positive")]
    InvalidFactor(f64),
}

/// Pan/zoom state. Screen and world coordinates relate by
/// `world = screen / scale - offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scale: 1.0,
            x: 0.0,
            y: 0.0,
            width: positive_or(width, 1.0),
            height: positive_or(height, 1.0),
        }
    }

    pub fn screen_to_world(&self, screen_x: f64, screen_y: f64) -> Point {
        Point::new(screen_x / self.scale - self.x, screen_y / self.scale - self.y)
    }

    pub fn world_to_screen(&self, point: Point) -> (f64, f64) {
        ((point.x + self.x) * self.scale, (point.y + self.y) * self.scale)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.x += dx / self.scale;
        self.y += dy / self.scale;
    }

    /// Multiplies the scale by `factor` while keeping the world point under
    /// the screen anchor in place. The scale is clamped to
    /// `[MIN_SCALE, MAX_SCALE]`; the offset follows the clamped value.
    pub fn zoom_at(&mut self, factor: f64, anchor_x: f64, anchor_y: f64) -> Result<(), ViewportError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(ViewportError::InvalidFactor(factor));
        }
        self.scale_about(factor, anchor_x, anchor_y);
        Ok(())
    }

    pub fn wheel(&mut self, direction: f64, anchor_x: f64, anchor_y: f64) {
        let factor = if direction > 0.0 {
            1.0 + ZOOM_STEP
        } else if direction < 0.0 {
            1.0 - ZOOM_STEP
        } else {
            return;
        };
        self.scale_about(factor, anchor_x, anchor_y);
    }

    fn scale_about(&mut self, factor: f64, anchor_x: f64, anchor_y: f64) {
        let previous = self.scale;
        let next = (previous * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.scale = next;
        self.x += (self.width / next - self.width / previous) * (anchor_x / self.width);
        self.y += (self.height / next - self.height / previous) * (anchor_y / self.height);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && width.is_finite() {
            self.width = width;
        }
        if height > 0.0 && height.is_finite() {
            self.height = height;
        }
    }

    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.x = 0.0;
        self.y = 0.0;
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value > 0.0 && value.is_finite() {
        value
    } else {
        fallback
    }
}
