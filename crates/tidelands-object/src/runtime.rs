//! Live binding between an abstract object and its physics body.

use glam::Vec2;
use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};
use tidelands_core::Result;

use crate::descriptor::{AbstractObject, BodyState, ObjectFlags};
use crate::physics::PhysicsWorld;
use crate::ObjectId;

/// Wraps one [`AbstractObject`] and exclusively owns its physics body.
///
/// The body is created with the runtime and destroyed with it; no body may
/// outlive its runtime, otherwise stale collision callbacks could reference
/// freed abstract state. Removal therefore always goes through
/// [`ObjectRuntime::despawn`], which consumes the runtime.
pub struct ObjectRuntime {
    id: ObjectId,
    object: AbstractObject,
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

impl ObjectRuntime {
    /// Bind a descriptor to a fresh physics body.
    pub fn spawn(object: AbstractObject, physics: &mut PhysicsWorld) -> Result<Self> {
        let id = physics.allocate_id();
        let (body, collider) = physics.spawn_box(id, &object)?;
        Ok(Self {
            id,
            object,
            body,
            collider,
        })
    }

    /// World-unique id of this object.
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Read access to the abstract descriptor.
    pub const fn object(&self) -> &AbstractObject {
        &self.object
    }

    /// Mutable access to the abstract descriptor.
    pub fn object_mut(&mut self) -> &mut AbstractObject {
        &mut self.object
    }

    /// Whether the underlying descriptor wants removal.
    pub fn is_dead(&self) -> bool {
        self.object.is_dead()
    }

    /// Advance one frame: sync physics state into the descriptor, run the
    /// behavior step, and push any velocity change back to the body.
    pub fn tick(&mut self, dt: f32, physics: &mut PhysicsWorld) {
        let dynamic = self.object.flags.contains(ObjectFlags::DYNAMIC);
        let mut state = if dynamic {
            BodyState {
                position: physics.body_position(self.body),
                velocity: physics.body_velocity(self.body),
            }
        } else {
            BodyState {
                position: Vec2::new(self.object.x, self.object.y),
                velocity: Vec2::ZERO,
            }
        };

        let velocity_before = state.velocity;
        self.object.step(dt, &mut state);

        if dynamic && state.velocity != velocity_before {
            physics.set_body_velocity(self.body, state.velocity);
        }
    }

    /// Set the body's linear velocity directly.
    pub fn set_velocity(&self, physics: &mut PhysicsWorld, velocity: Vec2) {
        physics.set_body_velocity(self.body, velocity);
    }

    /// Cast a ray through the physics world, skipping this object and any
    /// particulates. Returns the id of the first hit.
    pub fn ray(&self, physics: &PhysicsWorld, origin: Vec2, to: Vec2) -> Option<ObjectId> {
        physics
            .cast_ray(origin, to, Some(self.collider))
            .map(|(id, _)| id)
    }

    /// Integer render position. Rounding is done in one place so draws
    /// never disagree by a sub-pixel between frames.
    pub fn render_pos(&self) -> (i32, i32) {
        (
            self.object.x.round() as i32,
            self.object.y.round() as i32,
        )
    }

    /// Body rotation converted to degrees at the render boundary.
    /// Internal state stays in radians.
    pub fn rotation_degrees(&self, physics: &PhysicsWorld) -> f32 {
        physics.body_rotation(self.body).to_degrees()
    }

    /// Destroy the physics body and recover the descriptor.
    pub fn despawn(self, physics: &mut PhysicsWorld) -> AbstractObject {
        physics.remove_body(self.body);
        self.object
    }
}
