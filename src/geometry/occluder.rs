//! Occluder primitives and the gather buffer they are collected into

use std::collections::HashSet;

use crate::math::Vec2;
use super::{Circle, Edge};

/// Per-primitive contract used by the light sweep
pub trait Occlude {
    /// Add this occluder's visible silhouette, as seen from `viewpoint`,
    /// to the buffer. Back-facing primitives add nothing.
    fn collect(&self, viewpoint: Vec2, out: &mut GatherBuffer);

    /// Ray parameter of the first hit along `origin + t * dir`, if any
    fn ray_intersect(&self, origin: Vec2, dir: Vec2) -> Option<f32>;
}

/// Any light-blocking primitive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Occluder {
    Edge(Edge),
    Circle(Circle),
}

impl Occlude for Occluder {
    fn collect(&self, viewpoint: Vec2, out: &mut GatherBuffer) {
        match self {
            Occluder::Edge(e) => e.collect(viewpoint, out),
            Occluder::Circle(c) => c.collect(viewpoint, out),
        }
    }

    fn ray_intersect(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        match self {
            Occluder::Edge(e) => e.ray_intersect(origin, dir),
            Occluder::Circle(c) => c.ray_intersect(origin, dir),
        }
    }
}

/// Deduplicated vertices, kept in insertion order so sweeps are deterministic
#[derive(Debug, Clone, Default)]
pub struct VertexSet {
    seen: HashSet<(u32, u32)>,
    points: Vec<Vec2>,
}

impl VertexSet {
    /// Returns false if the vertex was already present
    pub fn insert(&mut self, v: Vec2) -> bool {
        if self.seen.insert(v.bits()) {
            self.points.push(v);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec2> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.points.clear();
    }
}

/// Scratch space for one light build, reusable across lights
#[derive(Debug, Clone, Default)]
pub struct GatherBuffer {
    pub occluders: Vec<Occluder>,
    pub vertices: VertexSet,
}

impl GatherBuffer {
    pub fn clear(&mut self) {
        self.occluders.clear();
        self.vertices.clear();
    }
}
