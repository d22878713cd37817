//! Point quadtree keyed by integer tile position
//!
//! Nodes live in a flat arena and refer to their children by index, so a
//! rebuild is a `clear()` plus re-inserts without reallocating.

use crate::world::Area;

/// Points per leaf before it splits
const LEAF_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
enum Node<T> {
    Leaf(Vec<(i32, i32, T)>),
    /// Children in SW, SE, NW, NE order
    Branch([usize; 4]),
}

/// Quadtree over a square block of tiles storing a tag per inserted point
#[derive(Debug, Clone)]
pub struct PointQuadTree<T> {
    x0: i32,
    y0: i32,
    size: i32,
    /// Node span, `size` rounded up to a power of two
    span: i32,
    nodes: Vec<Node<T>>,
    len: usize,
}

impl<T: Copy> PointQuadTree<T> {
    /// Tree covering the `size` x `size` tiles starting at (x0, y0)
    pub fn new(x0: i32, y0: i32, size: i32) -> Self {
        assert!(size > 0, "quadtree size must be positive");
        Self {
            x0,
            y0,
            size,
            span: (size as u32).next_power_of_two() as i32,
            nodes: vec![Node::Leaf(Vec::new())],
            len: 0,
        }
    }

    pub fn bounds(&self) -> Area {
        Area::square(self.x0, self.y0, self.size)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every point, keeping the bounds
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::Leaf(Vec::new()));
        self.len = 0;
    }

    /// Insert a tagged point. Panics if the point is outside the tree bounds.
    pub fn insert(&mut self, x: i32, y: i32, tag: T) {
        assert!(
            self.bounds().contains(x, y),
            "point ({}, {}) outside quadtree {}", x, y, self.bounds()
        );
        let (mut node, mut nx, mut ny, mut size) = (0usize, self.x0, self.y0, self.span);
        loop {
            match &mut self.nodes[node] {
                Node::Branch(children) => {
                    let half = size / 2;
                    let (q, qx, qy) = child_of(x, y, nx, ny, half);
                    node = children[q];
                    nx = qx;
                    ny = qy;
                    size = half;
                }
                Node::Leaf(points) => {
                    if points.len() < LEAF_CAPACITY || size < 2 {
                        points.push((x, y, tag));
                        self.len += 1;
                        return;
                    }
                    let points = std::mem::take(points);
                    self.split(node, nx, ny, size, points);
                }
            }
        }
    }

    /// Turn a full leaf into a branch and push its points down one level
    fn split(&mut self, node: usize, nx: i32, ny: i32, size: i32, points: Vec<(i32, i32, T)>) {
        let half = size / 2;
        let first = self.nodes.len();
        for _ in 0..4 {
            self.nodes.push(Node::Leaf(Vec::new()));
        }
        self.nodes[node] = Node::Branch([first, first + 1, first + 2, first + 3]);
        for (x, y, tag) in points {
            let (q, _, _) = child_of(x, y, nx, ny, half);
            if let Node::Leaf(leaf) = &mut self.nodes[first + q] {
                leaf.push((x, y, tag));
            }
        }
    }

    /// Visit every point inside `area`
    pub fn query<F: FnMut(i32, i32, T)>(&self, area: &Area, mut visitor: F) {
        if self.is_empty() {
            return;
        }
        let mut stack = vec![(0usize, self.x0, self.y0, self.span)];
        while let Some((node, nx, ny, size)) = stack.pop() {
            if !Area::square(nx, ny, size).intersects(area) {
                continue;
            }
            match &self.nodes[node] {
                Node::Leaf(points) => {
                    for &(x, y, tag) in points {
                        if area.contains(x, y) {
                            visitor(x, y, tag);
                        }
                    }
                }
                Node::Branch(children) => {
                    let half = size / 2;
                    stack.push((children[0], nx, ny, half));
                    stack.push((children[1], nx + half, ny, half));
                    stack.push((children[2], nx, ny + half, half));
                    stack.push((children[3], nx + half, ny + half, half));
                }
            }
        }
    }

    /// All points, in no particular order
    pub fn points(&self) -> Vec<(i32, i32, T)> {
        let mut out = Vec::with_capacity(self.len);
        self.query(&self.bounds(), |x, y, tag| out.push((x, y, tag)));
        out
    }
}

/// Child quadrant of (x, y) inside the node at (nx, ny) split at `half`
fn child_of(x: i32, y: i32, nx: i32, ny: i32, half: i32) -> (usize, i32, i32) {
    let east = x >= nx + half;
    let north = y >= ny + half;
    let q = (east as usize) | ((north as usize) << 1);
    let qx = if east { nx + half } else { nx };
    let qy = if north { ny + half } else { ny };
    (q, qx, qy)
}
