//! 2D vector math for occluder geometry and light fans

use std::ops::{Add, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};

/// 2D Vector in tile units (x east, y north)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians (counter-clockwise from +x)
    pub fn from_angle(angle: f32) -> Self {
        Self { x: angle.cos(), y: angle.sin() }
    }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn len(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn len_sq(self) -> f32 {
        self.dot(self)
    }

    pub fn normalize(self) -> Vec2 {
        let l = self.len();
        if l == 0.0 {
            return Vec2::ZERO;
        }
        Vec2 {
            x: self.x / l,
            y: self.y / l,
        }
    }

    /// Counter-clockwise perpendicular
    pub fn perp(self) -> Vec2 {
        Vec2 { x: -self.y, y: self.x }
    }

    /// Angle of this vector in (-PI, PI]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).len()
    }

    /// Bit-exact key, used to deduplicate vertices in hash sets
    pub fn bits(self) -> (u32, u32) {
        // -0.0 and 0.0 are the same vertex
        let x = if self.x == 0.0 { 0.0f32 } else { self.x };
        let y = if self.y == 0.0 { 0.0f32 } else { self.y };
        (x.to_bits(), y.to_bits())
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, s: f32) -> Vec2 {
        Vec2 {
            x: self.x * s,
            y: self.y * s,
        }
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2 { x: -self.x, y: -self.y }
    }
}

/// Wrap an angle into [-PI, PI)
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut a = angle;
    while a >= PI {
        a -= TAU;
    }
    while a < -PI {
        a += TAU;
    }
    a
}
