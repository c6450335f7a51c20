//! Central-body gravity and the fixed-timestep integrator.
//!
//! All tuning constants are compile-time; none adapt to wall-clock drift.
//! The integrator is semi-implicit Euler: velocity first from the current
//! position, then position from the new velocity. Swapping that order breaks
//! orbit stability.

use rand::Rng;

use crate::{entity::Entity, math::Vec2};

/// Gravitational constant (tuned for the simulation).
pub const G: f64 = 0.0001;
/// Mass of the central star.
pub const CENTRAL_MASS: f64 = 1_000_000.0;
/// Minimum spawn distance from the star.
pub const MIN_DISTANCE: f64 = 10.0;
/// Maximum spawn distance from the star.
pub const MAX_DISTANCE: f64 = 100.0;
/// Fixed simulation step (approx 60 FPS).
pub const TIME_STEP: f64 = 0.016;
/// Floor applied to distance before the inverse-square term.
pub const SOFTENING_RADIUS: f64 = 0.1;

/// Gravitational acceleration toward the origin.
///
/// The softening floor caps the magnitude at its value for a body
/// `SOFTENING_RADIUS` away; the direction is always the true unit vector
/// toward the star. The origin itself has no defined direction and yields
/// zero.
pub fn acceleration(position: Vec2) -> Vec2 {
    let dist = position.length();
    if dist == 0.0 {
        return Vec2::ZERO;
    }
    let r = dist.max(SOFTENING_RADIUS);
    let pull = -G * CENTRAL_MASS / (r * r);
    position * (pull / dist)
}

/// Advances one entity by one fixed step.
pub fn integrate(entity: &mut Entity, dt: f64) {
    let accel = acceleration(entity.position);
    entity.velocity += accel * dt;
    entity.position += entity.velocity * dt;
}

/// Spawn position: uniform in angle over [0, 2π) and uniform in radius
/// (not area) over [`MIN_DISTANCE`, `MAX_DISTANCE`).
pub fn random_orbit_position<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let theta = rng.gen_range(0.0..std::f64::consts::TAU);
    let radius = rng.gen_range(MIN_DISTANCE..MAX_DISTANCE);
    Vec2::new(radius * theta.cos(), radius * theta.sin())
}
