//! Square-cell quadtree over a position snapshot, stored as a flat arena and
//! walked in pre-order like `d3.quadtree().visit`.

use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

pub(super) struct QuadCell {
    pub(super) min: Vec2,
    pub(super) size: f32,
    pub(super) mass: f32,
    pub(super) centroid: Vec2,
    /// Bodies held by a leaf. Inner cells keep none.
    pub(super) bodies: Vec<usize>,
    children: [Option<usize>; 4],
}

impl QuadCell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// Squared distance from `point` to the closest point of the cell.
    pub(super) fn distance_sq(&self, point: Vec2) -> f32 {
        let nearest = point.clamp(self.min, self.min + Vec2::splat(self.size));
        (point - nearest).length_sq()
    }
}

pub(super) struct QuadTree {
    cells: Vec<QuadCell>,
}

impl QuadTree {
    /// `None` for an empty snapshot or one with a non-finite position.
    pub(super) fn build(points: &[Vec2]) -> Option<Self> {
        if points.is_empty() || points.iter().any(|point| !point.is_finite()) {
            return None;
        }
        let (min, max) = points.iter().fold(
            (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );
        let size = (max - min).max_elem().max(1.0) + 2.0;

        let mut tree = Self {
            cells: Vec::with_capacity(points.len() / LEAF_CAPACITY * 2 + 1),
        };
        tree.split(min - Vec2::splat(1.0), size, (0..points.len()).collect(), points, 0);
        Some(tree)
    }

    fn split(
        &mut self,
        min: Vec2,
        size: f32,
        bodies: Vec<usize>,
        points: &[Vec2],
        depth: usize,
    ) -> usize {
        let mass = bodies.len() as f32;
        let centroid = if bodies.is_empty() {
            min + Vec2::splat(size / 2.0)
        } else {
            bodies.iter().fold(Vec2::ZERO, |sum, &body| sum + points[body]) / mass
        };

        let index = self.cells.len();
        let leaf = depth >= MAX_DEPTH || bodies.len() <= LEAF_CAPACITY;
        self.cells.push(QuadCell {
            min,
            size,
            mass,
            centroid,
            bodies: Vec::new(),
            children: [None; 4],
        });
        if leaf {
            self.cells[index].bodies = bodies;
            return index;
        }

        let half = size / 2.0;
        let mid = min + Vec2::splat(half);
        let mut quadrants: [Vec<usize>; 4] = Default::default();
        for body in bodies {
            let point = points[body];
            let quadrant = usize::from(point.x >= mid.x) + 2 * usize::from(point.y >= mid.y);
            quadrants[quadrant].push(body);
        }

        for (quadrant, members) in quadrants.into_iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            let offset = vec2((quadrant & 1) as f32 * half, (quadrant >> 1) as f32 * half);
            let child = self.split(min + offset, half, members, points, depth + 1);
            self.cells[index].children[quadrant] = Some(child);
        }
        index
    }

    /// Pre-order walk. Returning `true` from `visit` skips the cell's children.
    pub(super) fn visit(&self, mut visit: impl FnMut(&QuadCell) -> bool) {
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            let cell = &self.cells[index];
            if visit(cell) {
                continue;
            }
            stack.extend(cell.children.iter().rev().flatten());
        }
    }

    #[cfg(test)]
    fn root(&self) -> &QuadCell {
        &self.cells[0]
    }
}
