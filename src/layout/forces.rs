use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadTree;
use super::simulation::{Body, Force, TickContext};
use crate::network::BBox;

const DEFAULT_LINK_DISTANCE: f32 = 30.0;
const DEFAULT_CHARGE: f32 = -30.0;
const THETA_SQ: f32 = 0.81;
const DISTANCE_MIN_SQ: f32 = 1.0;

/// Spring between linked bodies. Low-degree ends absorb more of the
/// correction than hub ends.
pub struct LinkForce {
    links: Vec<(usize, usize)>,
    distances: Vec<f32>,
    strengths: Vec<f32>,
    biases: Vec<f32>,
}

impl LinkForce {
    /// Links referring to bodies outside `0..body_count` or to themselves are ignored.
    pub fn new(links: Vec<(usize, usize)>, body_count: usize) -> Self {
        let links = links
            .into_iter()
            .filter(|&(source, target)| {
                source != target && source < body_count && target < body_count
            })
            .collect::<Vec<_>>();

        let mut counts = vec![0usize; body_count];
        for &(source, target) in &links {
            counts[source] += 1;
            counts[target] += 1;
        }

        let strengths = links
            .iter()
            .map(|&(source, target)| 1.0 / counts[source].min(counts[target]) as f32)
            .collect();
        let biases = links
            .iter()
            .map(|&(source, target)| {
                counts[source] as f32 / (counts[source] + counts[target]) as f32
            })
            .collect();

        Self {
            distances: vec![DEFAULT_LINK_DISTANCE; links.len()],
            links,
            strengths,
            biases,
        }
    }

    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distances.fill(distance);
        self
    }

    /// Per-link rest length from the `(source, target)` pair.
    pub fn with_distance_by(mut self, distance: impl Fn(usize, usize) -> f32) -> Self {
        for (slot, &(source, target)) in self.distances.iter_mut().zip(&self.links) {
            *slot = distance(source, target);
        }
        self
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strengths.fill(strength);
        self
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Force for LinkForce {
    fn apply(&mut self, bodies: &mut [Body], ctx: &mut TickContext<'_>) {
        for (link, &(source, target)) in self.links.iter().enumerate() {
            let mut delta = bodies[target].predicted() - bodies[source].predicted();
            if delta.x == 0.0 {
                delta.x = ctx.jiggle();
            }
            if delta.y == 0.0 {
                delta.y = ctx.jiggle();
            }
            let length = delta.length();
            let pull = (length - self.distances[link]) / length * ctx.alpha * self.strengths[link];
            let delta = delta * pull;

            let bias = self.biases[link];
            bodies[target].vel -= delta * bias;
            bodies[source].vel += delta * (1.0 - bias);
        }
    }
}

/// Barnes-Hut approximated charge between every pair of bodies.
pub struct ManyBody {
    strength: f32,
}

impl ManyBody {
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }
}

impl Default for ManyBody {
    fn default() -> Self {
        Self::new(DEFAULT_CHARGE)
    }
}

impl Force for ManyBody {
    fn apply(&mut self, bodies: &mut [Body], ctx: &mut TickContext<'_>) {
        let positions = bodies.iter().map(|body| body.pos).collect::<Vec<_>>();
        let Some(tree) = QuadTree::build(&positions) else {
            return;
        };

        for (index, body) in bodies.iter_mut().enumerate() {
            let point = positions[index];
            let mut velocity = Vec2::ZERO;
            tree.visit(|cell| {
                if cell.mass <= 0.0 {
                    return true;
                }
                if cell.is_leaf() {
                    for &other in &cell.bodies {
                        if other == index {
                            continue;
                        }
                        let mut delta = positions[other] - point;
                        if delta.x == 0.0 {
                            delta.x = ctx.jiggle();
                        }
                        if delta.y == 0.0 {
                            delta.y = ctx.jiggle();
                        }
                        velocity += delta * (self.strength * ctx.alpha / softened(delta.length_sq()));
                    }
                    return true;
                }

                let delta = cell.centroid - point;
                let distance_sq = delta.length_sq();
                if cell.size * cell.size / THETA_SQ < distance_sq {
                    velocity += delta * (self.strength * cell.mass * ctx.alpha / softened(distance_sq));
                    return true;
                }
                false
            });
            body.vel += velocity;
        }
    }
}

fn softened(distance_sq: f32) -> f32 {
    if distance_sq < DISTANCE_MIN_SQ {
        (DISTANCE_MIN_SQ * distance_sq).sqrt()
    } else {
        distance_sq
    }
}

/// Circle collision on predicted positions. Each overlapping pair is
/// separated in proportion to the other body's squared radius.
pub struct Collide {
    pub radii: Vec<f32>,
    strength: f32,
}

impl Collide {
    pub fn new(radii: Vec<f32>) -> Self {
        Self {
            radii,
            strength: 1.0,
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }
}

impl Force for Collide {
    fn apply(&mut self, bodies: &mut [Body], ctx: &mut TickContext<'_>) {
        let count = bodies.len().min(self.radii.len());
        let snapshot = bodies[..count]
            .iter()
            .map(Body::predicted)
            .collect::<Vec<_>>();
        let Some(tree) = QuadTree::build(&snapshot) else {
            return;
        };
        let max_radius = self.radii[..count].iter().copied().fold(0.0_f32, f32::max);

        for index in 0..count {
            let radius = self.radii[index];
            let point = bodies[index].predicted();
            let search = radius + max_radius;
            let mut candidates = Vec::new();
            tree.visit(|cell| {
                if cell.distance_sq(point) > search * search {
                    return true;
                }
                candidates.extend(cell.bodies.iter().copied().filter(|&other| other > index));
                false
            });

            for other in candidates {
                let other_radius = self.radii[other];
                let reach = radius + other_radius;
                let mut delta = point - bodies[other].predicted();
                let mut distance_sq = delta.length_sq();
                if distance_sq >= reach * reach {
                    continue;
                }
                if delta.x == 0.0 {
                    delta.x = ctx.jiggle();
                    distance_sq += delta.x * delta.x;
                }
                if delta.y == 0.0 {
                    delta.y = ctx.jiggle();
                    distance_sq += delta.y * delta.y;
                }
                let distance = distance_sq.sqrt();
                let push = delta * ((reach - distance) / distance * self.strength);
                let other_sq = other_radius * other_radius;
                let share = other_sq / (radius * radius + other_sq);

                bodies[index].vel += push * share;
                bodies[other].vel -= push * (1.0 - share);
            }
        }
    }
}

/// Rectangle collision. Boxes are relative to each body and overlapping
/// pairs push apart along both axes.
pub struct BBoxCollide {
    boxes: Vec<BBox>,
    strength: f32,
    iterations: usize,
}

impl BBoxCollide {
    pub fn new(boxes: Vec<BBox>) -> Self {
        Self {
            boxes,
            strength: 1.0,
            iterations: 1,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }

    fn placed(&self, bodies: &[Body], index: usize) -> (Vec2, Vec2) {
        let center = bodies[index].predicted();
        let bbox = self.boxes[index];
        (center + bbox.min, center + bbox.max)
    }
}

impl Force for BBoxCollide {
    fn apply(&mut self, bodies: &mut [Body], _ctx: &mut TickContext<'_>) {
        let count = bodies.len().min(self.boxes.len());
        if self.strength == 0.0 || count < 2 {
            return;
        }

        for _ in 0..self.iterations {
            let mut order = (0..count).collect::<Vec<_>>();
            let left = |index: usize| bodies[index].predicted().x + self.boxes[index].min.x;
            order.sort_by(|&a, &b| left(a).total_cmp(&left(b)));

            for (rank, &index) in order.iter().enumerate() {
                for &other in &order[rank + 1..] {
                    let (min_a, max_a) = self.placed(bodies, index);
                    let (min_b, max_b) = self.placed(bodies, other);
                    if min_b.x > max_a.x {
                        break;
                    }
                    if min_a.y > max_b.y || min_b.y > max_a.y {
                        continue;
                    }
                    self.push_apart(bodies, index, other, (min_a, max_a), (min_b, max_b));
                }
            }
        }
    }
}

impl BBoxCollide {
    fn push_apart(
        &self,
        bodies: &mut [Body],
        a: usize,
        b: usize,
        (min_a, max_a): (Vec2, Vec2),
        (min_b, max_b): (Vec2, Vec2),
    ) {
        let size_a = vec2(self.boxes[a].width(), self.boxes[a].height()).max(Vec2::splat(1e-6));
        let size_b = vec2(self.boxes[b].width(), self.boxes[b].height()).max(Vec2::splat(1e-6));
        let span = max_a.max(max_b) - min_a.min(min_b);
        let overlap = size_a + size_b - span;

        let push_a = vec2(
            overlap.x * self.strength * (overlap.y / size_a.y),
            overlap.y * self.strength * (overlap.x / size_a.x),
        );
        let push_b = vec2(
            overlap.x * self.strength * (overlap.y / size_b.y),
            overlap.y * self.strength * (overlap.x / size_b.x),
        );

        let center_a = (min_a + max_a) * 0.5;
        let center_b = (min_b + max_b) * 0.5;
        let sign_x = if center_a.x < center_b.x { -1.0 } else { 1.0 };
        let sign_y = if center_a.y < center_b.y { -1.0 } else { 1.0 };
        let direction = vec2(sign_x, sign_y);

        bodies[a].vel += push_a * direction;
        bodies[b].vel -= push_b * direction;
    }
}

/// Pulls every body toward a vertical line.
pub struct PositionX {
    target: f32,
    strength: f32,
}

impl PositionX {
    pub fn new(target: f32, strength: f32) -> Self {
        Self { target, strength }
    }
}

impl Force for PositionX {
    fn apply(&mut self, bodies: &mut [Body], ctx: &mut TickContext<'_>) {
        for body in bodies {
            body.vel.x += (self.target - body.pos.x) * self.strength * ctx.alpha;
        }
    }
}

/// Pulls every body toward a horizontal line.
pub struct PositionY {
    target: f32,
    strength: f32,
}

impl PositionY {
    pub fn new(target: f32, strength: f32) -> Self {
        Self { target, strength }
    }
}

impl Force for PositionY {
    fn apply(&mut self, bodies: &mut [Body], ctx: &mut TickContext<'_>) {
        for body in bodies {
            body.vel.y += (self.target - body.pos.y) * self.strength * ctx.alpha;
        }
    }
}

/// Pulls every body toward a circle around `center`.
pub struct Radial {
    radius: f32,
    center: Vec2,
    strength: f32,
}

impl Radial {
    pub fn new(radius: f32, center: Vec2, strength: f32) -> Self {
        Self {
            radius,
            center,
            strength,
        }
    }
}

impl Force for Radial {
    fn apply(&mut self, bodies: &mut [Body], ctx: &mut TickContext<'_>) {
        for body in bodies {
            let mut delta = body.pos - self.center;
            if delta.x == 0.0 {
                delta.x = 1e-6;
            }
            if delta.y == 0.0 {
                delta.y = 1e-6;
            }
            let distance = delta.length();
            let k = (self.radius - distance) * self.strength * ctx.alpha / distance;
            body.vel += delta * k;
        }
    }
}

/// Post-tick constraint pulling selected bodies back inside a circle at the origin.
pub struct RadialClamp {
    selected: Vec<bool>,
    radius: f32,
}

impl RadialClamp {
    pub fn new(selected: Vec<bool>, radius: f32) -> Self {
        Self { selected, radius }
    }

    pub fn constrain(&self, bodies: &mut [Body]) {
        for (body, &selected) in bodies.iter_mut().zip(&self.selected) {
            if !selected {
                continue;
            }
            let distance = body.pos.length();
            if distance > self.radius {
                body.pos = body.pos / distance * self.radius;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::layout::simulation::Simulation;

    fn tick(bodies: Vec<Body>, force: &mut dyn Force, ticks: usize) -> Vec<Body> {
        let mut rng = StdRng::seed_from_u64(11);
        let mut simulation = Simulation::new(bodies);
        for _ in 0..ticks {
            simulation.step(&mut [&mut *force], &mut rng);
        }
        simulation.bodies
    }

    #[test]
    fn link_pulls_toward_rest_length() {
        let bodies = vec![Body::pinned(Vec2::ZERO), Body::free(vec2(100.0, 0.0))];
        let mut links = LinkForce::new(vec![(0, 1), (1, 1), (0, 7)], 2).with_distance(40.0);
        assert_eq!(links.len(), 1);

        let bodies = tick(bodies, &mut links, 300);
        assert!((bodies[1].pos.x - 40.0).abs() < 2.0, "{:?}", bodies[1].pos);
    }

    #[test]
    fn zero_strength_link_is_inert() {
        let bodies = vec![Body::pinned(Vec2::ZERO), Body::free(vec2(100.0, 0.0))];
        let mut links = LinkForce::new(vec![(0, 1)], 2).with_strength(0.0);
        let bodies = tick(bodies, &mut links, 50);
        assert_eq!(bodies[1].pos, vec2(100.0, 0.0));
    }

    #[test]
    fn negative_charge_repels() {
        let bodies = (0..30)
            .map(|index| Body::free(vec2((index % 6) as f32, (index / 6) as f32)))
            .collect::<Vec<_>>();
        let spread_before = bodies.iter().map(|body| body.pos.length()).fold(0.0, f32::max);
        let bodies = tick(bodies, &mut ManyBody::default(), 100);
        let spread_after = bodies.iter().map(|body| body.pos.length()).fold(0.0, f32::max);
        assert!(spread_after > spread_before * 2.0);
    }

    #[test]
    fn collide_separates_overlapping_circles() {
        let bodies = vec![Body::free(vec2(0.0, 0.0)), Body::free(vec2(1.0, 0.0))];
        let mut collide = Collide::new(vec![10.0, 10.0]);
        let bodies = tick(bodies, &mut collide, 100);
        assert!((bodies[0].pos - bodies[1].pos).length() >= 19.0);
    }

    #[test]
    fn collide_splits_coincident_circles() {
        let bodies = vec![Body::free(Vec2::ZERO), Body::free(Vec2::ZERO)];
        let mut collide = Collide::new(vec![5.0, 5.0]);
        let bodies = tick(bodies, &mut collide, 200);
        assert!((bodies[0].pos - bodies[1].pos).length() > 1.0);
    }

    #[test]
    fn bbox_collide_pushes_along_both_axes() {
        let mut bodies = vec![Body::free(vec2(0.0, 0.0)), Body::free(vec2(4.0, 2.0))];
        let mut collide = BBoxCollide::new(vec![BBox::square(5.0), BBox::square(5.0)]);
        collide.set_strength(0.5);

        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TickContext {
            alpha: 1.0,
            rng: &mut rng,
        };
        collide.apply(&mut bodies, &mut ctx);
        assert!(bodies[0].vel.x < 0.0 && bodies[0].vel.y < 0.0);
        assert!(bodies[1].vel.x > 0.0 && bodies[1].vel.y > 0.0);
    }

    #[test]
    fn bbox_collide_ignores_separate_boxes() {
        let mut bodies = vec![Body::free(vec2(0.0, 0.0)), Body::free(vec2(40.0, 0.0))];
        let mut collide = BBoxCollide::new(vec![BBox::square(5.0), BBox::square(5.0)]);
        collide.set_strength(1.0);

        let mut rng = StdRng::seed_from_u64(3);
        let mut ctx = TickContext {
            alpha: 1.0,
            rng: &mut rng,
        };
        collide.apply(&mut bodies, &mut ctx);
        assert_eq!(bodies[0].vel, Vec2::ZERO);
        assert_eq!(bodies[1].vel, Vec2::ZERO);
    }

    #[test]
    fn radial_settles_on_the_circle() {
        let bodies = vec![Body::free(vec2(10.0, 0.0)), Body::free(vec2(0.0, 300.0))];
        let bodies = tick(bodies, &mut Radial::new(100.0, Vec2::ZERO, 0.5), 300);
        for body in bodies {
            assert!((body.pos.length() - 100.0).abs() < 5.0, "{:?}", body.pos);
        }
    }

    #[test]
    fn position_forces_center_bodies() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut simulation = Simulation::new(vec![Body::free(vec2(50.0, -50.0))]);
        let mut x = PositionX::new(10.0, 0.1);
        let mut y = PositionY::new(10.0, 0.1);
        for _ in 0..300 {
            simulation.step(&mut [&mut x, &mut y], &mut rng);
        }
        assert!((simulation.bodies[0].pos - vec2(10.0, 10.0)).length() < 5.0);
    }

    #[test]
    fn clamp_only_touches_selected_bodies() {
        let mut bodies = vec![Body::free(vec2(300.0, 400.0)), Body::free(vec2(300.0, 400.0))];
        RadialClamp::new(vec![true, false], 100.0).constrain(&mut bodies);
        assert!((bodies[0].pos.length() - 100.0).abs() < 1e-3);
        assert_eq!(bodies[1].pos, vec2(300.0, 400.0));
    }
}
