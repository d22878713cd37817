//! Spatial containers shared by the geometry index

mod quadtree;

pub use quadtree::PointQuadTree;
