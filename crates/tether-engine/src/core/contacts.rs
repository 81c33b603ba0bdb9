//! Aggregate contact-graph readings for a single body.

use glam::Vec2;

use crate::core::physics::{BodyHandle, PhysicsSpace};

/// What a body is touching and how hard it is being pushed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactSummary {
    /// Number of other bodies in active contact.
    pub touching: usize,
    /// Sum of contact impulses over the last step.
    pub impulse: Vec2,
    /// Magnitude of the summed impulse divided by the step size.
    pub force: f32,
    /// Summed impulse projected on gravity, as a mass.
    pub weight: f32,
    /// How much of the contact impulse cancels out; large when squeezed
    /// from opposite sides.
    pub crush: f32,
}

impl ContactSummary {
    pub fn for_body(space: &PhysicsSpace, body: BodyHandle) -> Self {
        let dt = space.time_step();
        let contacts = space.contacts(body);

        let mut impulse = Vec2::ZERO;
        let mut magnitude_sum = 0.0;
        for contact in &contacts {
            impulse += contact.total_impulse;
            magnitude_sum += contact.total_impulse.length();
        }

        let gravity = space.gravity();
        let weight = if gravity.length_squared() > 0.0 && dt > 0.0 {
            gravity.dot(impulse).abs() / (gravity.length_squared() * dt)
        } else {
            0.0
        };
        let force = if dt > 0.0 { impulse.length() / dt } else { 0.0 };

        Self {
            touching: contacts.len(),
            impulse,
            force,
            weight,
            crush: (magnitude_sum - impulse.length()) * dt,
        }
    }
}
