use eframe::egui::{Vec2, vec2};
use rand::Rng;
use rand::rngs::StdRng;

pub(super) const VELOCITY_DECAY: f32 = 0.6;

/// One simulated point. A pinned body snaps to its pin every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub pin: Option<Vec2>,
}

impl Body {
    pub fn free(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            pin: None,
        }
    }

    pub fn pinned(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            pin: Some(pos),
        }
    }

    /// Position after this tick's velocity, used by collision forces.
    pub fn predicted(&self) -> Vec2 {
        self.pos + self.vel
    }
}

pub struct TickContext<'a> {
    pub alpha: f32,
    pub rng: &'a mut StdRng,
}

impl TickContext<'_> {
    /// Tiny random offset for separating exactly coincident bodies.
    pub fn jiggle(&mut self) -> f32 {
        (self.rng.gen_range(0.0..1.0_f32) - 0.5) * 1e-6
    }
}

/// A force adds to body velocities once per tick.
pub trait Force {
    fn apply(&mut self, bodies: &mut [Body], ctx: &mut TickContext<'_>);
}

/// Manually ticked simulation: cooling alpha, decaying velocities.
pub struct Simulation {
    pub bodies: Vec<Body>,
    alpha: f32,
    alpha_decay: f32,
    alpha_target: f32,
    velocity_decay: f32,
}

impl Simulation {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self {
            bodies,
            alpha: 1.0,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            alpha_target: 0.0,
            velocity_decay: VELOCITY_DECAY,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn step(&mut self, forces: &mut [&mut dyn Force], rng: &mut StdRng) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        let mut ctx = TickContext {
            alpha: self.alpha,
            rng,
        };
        for force in forces.iter_mut() {
            force.apply(&mut self.bodies, &mut ctx);
        }

        for body in &mut self.bodies {
            match body.pin {
                Some(pin) => {
                    body.pos = pin;
                    body.vel = Vec2::ZERO;
                }
                None => {
                    body.vel *= self.velocity_decay;
                    body.pos += body.vel;
                }
            }
        }
    }
}

/// Collision strength schedule: eases in quadratically up to `max`.
pub fn ramp(tick: usize, total: usize, max: f32) -> f32 {
    if total == 0 {
        return max;
    }
    let t = tick as f32 / total as f32;
    t * t * max
}

/// A point within one unit of `center` on each axis, random sign.
pub fn jitter_around(center: Vec2, rng: &mut StdRng) -> Vec2 {
    let mut axis = || {
        let magnitude = rng.gen_range(0.0..1.0_f32);
        if rng.gen_bool(0.5) { magnitude } else { -magnitude }
    };
    let dx = axis();
    let dy = axis();
    center + vec2(dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct Push(Vec2);

    impl Force for Push {
        fn apply(&mut self, bodies: &mut [Body], ctx: &mut TickContext<'_>) {
            for body in bodies {
                body.vel += self.0 * ctx.alpha;
            }
        }
    }

    #[test]
    fn pinned_bodies_never_move() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut simulation = Simulation::new(vec![
            Body::pinned(vec2(5.0, 5.0)),
            Body::free(Vec2::ZERO),
        ]);
        let mut push = Push(vec2(1.0, 0.0));
        for _ in 0..10 {
            simulation.step(&mut [&mut push], &mut rng);
        }

        assert_eq!(simulation.bodies[0].pos, vec2(5.0, 5.0));
        assert_eq!(simulation.bodies[0].vel, Vec2::ZERO);
        assert!(simulation.bodies[1].pos.x > 0.0);
    }

    #[test]
    fn alpha_cools_to_a_thousandth_after_three_hundred_ticks() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut simulation = Simulation::new(vec![Body::free(Vec2::ZERO)]);
        for _ in 0..300 {
            simulation.step(&mut [], &mut rng);
        }
        assert!((simulation.alpha() - 0.001).abs() < 1e-4);
    }

    #[test]
    fn ramp_is_quadratic() {
        assert_eq!(ramp(0, 200, 0.8), 0.0);
        assert!((ramp(100, 200, 0.8) - 0.2).abs() < 1e-6);
        assert_eq!(ramp(5, 0, 0.8), 0.8);
    }

    #[test]
    fn jitter_stays_within_a_unit() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let point = jitter_around(vec2(3.0, -2.0), &mut rng);
            assert!((point.x - 3.0).abs() <= 1.0);
            assert!((point.y + 2.0).abs() <= 1.0);
        }
    }
}
