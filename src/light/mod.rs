//! Point lights and their visibility polygons
//!
//! A `Light2D` owns its sweep result: the hit points of the last geometry
//! build, sorted into triangle fan order. The fan is only drawable when
//! `is_valid()` (at least 3 hit points); callers check before use.

mod ray;

pub use ray::{Ray2D, sort_fan, simplify_fan};

use serde::{Serialize, Deserialize};

use crate::geometry::Geometry;
use crate::math::Vec2;

/// 8-bit RGBA light color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Packed as 0xRRGGBBAA
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    pub fn from_u32(rgba: u32) -> Self {
        let [r, g, b, a] = rgba.to_be_bytes();
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light2D {
    origin: Vec2,
    radius: f32,
    height: f32,
    color: Color,
    intensity: f32,
    rays: Vec<Ray2D>,
}

impl Light2D {
    pub fn new(origin: Vec2, radius: f32) -> Self {
        Self {
            origin,
            radius,
            height: 1.0,
            color: Color::WHITE,
            intensity: 1.0,
            rays: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Rebuild the visibility polygon against the current geometry
    pub fn update_geometry(&mut self, geometry: &Geometry) {
        geometry.build_light(self);
    }

    pub(crate) fn set_rays(&mut self, rays: Vec<Ray2D>) {
        self.rays = rays;
    }

    /// Sorted hit points of the last build
    pub fn rays(&self) -> &[Ray2D] {
        &self.rays
    }

    /// At least 3 hit points: something to draw
    pub fn is_valid(&self) -> bool {
        self.rays.len() >= 3
    }

    /// Fan vertex count, origin included
    pub fn vertex_count(&self) -> usize {
        1 + self.rays.len()
    }

    /// Triangle fan: origin followed by the hit points
    pub fn fan(&self) -> Vec<Vec2> {
        std::iter::once(self.origin)
            .chain(self.rays.iter().map(|r| r.point))
            .collect()
    }

    /// Append the fan as interleaved x, y floats
    pub fn write_fan(&self, out: &mut Vec<f32>) {
        out.reserve(self.vertex_count() * 2);
        out.push(self.origin.x);
        out.push(self.origin.y);
        for ray in &self.rays {
            out.push(ray.point.x);
            out.push(ray.point.y);
        }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    /// Center the light in tile (x, y)
    pub fn set_origin_discrete(&mut self, x: i32, y: i32) {
        self.origin = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
    }

    /// Tile the origin is in
    pub fn origin_discrete(&self) -> (i32, i32) {
        (self.origin.x.floor() as i32, self.origin.y.floor() as i32)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.origin = self.origin + delta;
    }

    /// Move by whole tiles, snapping to the tile center
    pub fn translate_discrete(&mut self, dx: i32, dy: i32) {
        let (x, y) = self.origin_discrete();
        self.set_origin_discrete(x + dx, y + dy);
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub fn adjust_radius(&mut self, amount: f32) {
        self.radius += amount;
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }

    pub fn adjust_height(&mut self, amount: f32) {
        self.height += amount;
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    pub fn adjust_intensity(&mut self, amount: f32) {
        self.intensity += amount;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}
