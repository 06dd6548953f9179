use std::time::{Duration, Instant};

use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

use crate::layout::RingGeometry;

/// Width in device pixels that maps to a scale factor of 1.
const BASE_WIDTH: f32 = 1500.0;
const MIN_PIXEL_RATIO: f32 = 2.0;
/// The outer ring is kept at least this many times the ring radius.
const OUTER_RING_FACTOR: f32 = 1.6;

pub const MIN_ZOOM: f32 = 0.4;
pub const MAX_ZOOM: f32 = 6.0;
pub const ZOOM_STEP: f32 = 1.2;
pub const CLICK_SUPPRESS_WINDOW: Duration = Duration::from_millis(150);

/// Canvas size in CSS pixels and the display's device pixel ratio.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl ViewportConfig {
    pub fn viewport(&self, ring: &RingGeometry) -> Viewport {
        Viewport::resize(self.width, self.height, self.device_pixel_ratio, ring)
    }
}

/// Canvas geometry in device pixels and the layout-to-device scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pixel_ratio: f32,
    pub width: f32,
    pub height: f32,
    pub scale_factor: f32,
}

impl Viewport {
    pub fn resize(css_width: f32, css_height: f32, device_pixel_ratio: f32, ring: &RingGeometry) -> Self {
        let pixel_ratio = device_pixel_ratio.max(MIN_PIXEL_RATIO);
        let width = (css_width * pixel_ratio).round();
        let height = (css_height * pixel_ratio).round();

        let mut scale_factor = width / BASE_WIDTH;
        let outer = ring.outer_radius().max(ring.radius * OUTER_RING_FACTOR);
        if outer > 0.0 && width / 2.0 < outer * scale_factor {
            scale_factor = width / (2.0 * outer);
        }

        Self {
            pixel_ratio,
            width,
            height,
            scale_factor,
        }
    }

    fn half_extent(&self) -> Vec2 {
        vec2(self.width, self.height) / 2.0
    }

    /// CSS pointer position to layout coordinates.
    pub fn to_layout(&self, pointer: Vec2, zoom: &ZoomTransform) -> Vec2 {
        let device = pointer * self.pixel_ratio;
        let unzoomed = (device - zoom.translation() * self.pixel_ratio) / zoom.k;
        (unzoomed - self.half_extent()) / self.scale_factor
    }

    /// Layout coordinates to a CSS position.
    pub fn to_screen(&self, position: Vec2, zoom: &ZoomTransform) -> Vec2 {
        let unzoomed = position * self.scale_factor + self.half_extent();
        (unzoomed * zoom.k + zoom.translation() * self.pixel_ratio) / self.pixel_ratio
    }

    /// Layout distance to CSS pixels at the current zoom.
    pub fn scale_length(&self, length: f32, zoom: &ZoomTransform) -> f32 {
        length * self.scale_factor * zoom.k / self.pixel_ratio
    }
}

/// Pan and zoom in CSS pixels: `screen = k * p + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    pub k: f32,
    pub x: f32,
    pub y: f32,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn translation(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    pub fn apply(&self, point: Vec2) -> Vec2 {
        point * self.k + self.translation()
    }

    pub fn invert(&self, point: Vec2) -> Vec2 {
        (point - self.translation()) / self.k
    }

    /// Scales around `center`, keeping the point under it fixed.
    pub fn scale_by(&self, factor: f32, center: Vec2) -> Self {
        let anchor = self.invert(center);
        let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let translation = center - anchor * k;
        Self {
            k,
            x: translation.x,
            y: translation.y,
        }
    }

    pub fn translate_by(&self, delta: Vec2) -> Self {
        Self {
            k: self.k,
            x: self.x + delta.x,
            y: self.y + delta.y,
        }
    }
}

/// Lifecycle of a pan or zoom gesture, used to swallow the click that ends it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZoomGesture {
    panning: bool,
    moved: bool,
    moved_at: Option<Instant>,
    start: ZoomTransform,
}

impl ZoomGesture {
    pub fn start(&mut self, current: ZoomTransform) {
        self.panning = true;
        self.moved = false;
        self.start = current;
    }

    pub fn update(&mut self, transform: ZoomTransform) {
        if transform != self.start {
            self.moved = true;
        }
    }

    pub fn end(&mut self, now: Instant) {
        self.panning = false;
        if self.moved {
            self.moved_at = Some(now);
        }
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }

    pub fn should_suppress_click(&self, now: Instant) -> bool {
        self.panning
            || (self.moved
                && self
                    .moved_at
                    .is_some_and(|at| now.saturating_duration_since(at) < CLICK_SUPPRESS_WINDOW))
    }
}
