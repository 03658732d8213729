//! Physics world wrapper around rapier2d.
//!
//! The simulation plane is top-down, so gravity is zero. Stepping uses a
//! fixed timestep with a capped sub-step count so a single slow frame never
//! triggers unbounded catch-up work.

use crossbeam::channel::{unbounded, Receiver};
use glam::Vec2;
// The vector!/point! macros expand to nalgebra:: paths.
use rapier2d::na as nalgebra;
use rapier2d::prelude::{
    point, vector, ActiveEvents, CCDSolver, ChannelEventCollector, Collider, ColliderBuilder,
    ColliderHandle, ColliderSet, CollisionEvent, ContactForceEvent, DefaultBroadPhase,
    ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, QueryFilter, QueryPipeline, Ray, Real, RigidBodyBuilder, RigidBodyHandle,
    RigidBodySet, Vector,
};
use tidelands_core::{Error, Result};
use tracing::trace;

use crate::descriptor::{AbstractObject, ObjectFlags};
use crate::ObjectId;

/// Fixed simulation timestep in seconds.
pub const FIXED_DT: f32 = 1.0 / 60.0;
/// Maximum sub-steps per frame.
pub const MAX_SUBSTEPS: u32 = 4;

/// Flag bit stored above the object id in collider user data.
const PARTICULATE_BIT: u128 = 1 << 64;

/// Pack an object id and its ray-relevance into collider user data.
const fn pack_user_data(id: ObjectId, flags: ObjectFlags) -> u128 {
    let mut data = id.0 as u128;
    if flags.contains(ObjectFlags::PARTICULATE) {
        data |= PARTICULATE_BIT;
    }
    data
}

/// Owns the rapier2d sets and pipelines for one world.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_handler: ChannelEventCollector,
    collision_recv: Receiver<CollisionEvent>,
    force_recv: Receiver<ContactForceEvent>,
    accumulator: f32,
    next_id: u64,
    contacts: Vec<(ObjectId, ObjectId)>,
}

impl PhysicsWorld {
    /// Create an empty physics world.
    pub fn new() -> Self {
        let (collision_send, collision_recv) = unbounded();
        let (force_send, force_recv) = unbounded();
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = FIXED_DT;

        Self {
            gravity: vector![0.0, 0.0],
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_handler: ChannelEventCollector::new(collision_send, force_send),
            collision_recv,
            force_recv,
            accumulator: 0.0,
            next_id: 1,
            contacts: Vec::new(),
        }
    }

    /// Allocate a world-unique object id.
    pub fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a box body and collider for the given descriptor.
    ///
    /// Rejects zero or negative extents before anything touches the
    /// simulation; a zero-size fixture would have undefined collision
    /// behavior.
    pub fn spawn_box(
        &mut self,
        id: ObjectId,
        object: &AbstractObject,
    ) -> Result<(RigidBodyHandle, ColliderHandle)> {
        if object.width <= 0.0 || object.height <= 0.0 {
            return Err(Error::DegenerateCollider {
                width: object.width,
                height: object.height,
            });
        }

        let builder = if object.flags.contains(ObjectFlags::DYNAMIC) {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let body = builder.translation(vector![object.x, object.y]).build();
        let body_handle = self.bodies.insert(body);

        let collider = ColliderBuilder::cuboid(object.width * 0.5, object.height * 0.5)
            .sensor(object.flags.contains(ObjectFlags::SENSOR))
            .density(object.kind.density())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .user_data(pack_user_data(id, object.flags))
            .build();
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        self.query_pipeline.update(&self.colliders);
        trace!(id = id.0, kind = ?object.kind, "spawned physics body");
        Ok((body_handle, collider_handle))
    }

    /// Remove a body and its attached collider synchronously.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.query_pipeline.update(&self.colliders);
    }

    /// Number of live bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Advance the simulation by `dt` seconds of wall time.
    ///
    /// Runs whole fixed timesteps only; leftover time is carried in an
    /// accumulator. After the sub-step cap is hit any remaining backlog is
    /// dropped so catch-up work stays bounded.
    pub fn step(&mut self, dt: f32) {
        self.accumulator += dt;
        let mut substeps = 0;

        while self.accumulator >= FIXED_DT && substeps < MAX_SUBSTEPS {
            self.pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &(),
                &self.event_handler,
            );
            self.accumulator -= FIXED_DT;
            substeps += 1;
            self.drain_events();
        }

        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(FIXED_DT);
        }
    }

    /// Pull collision events out of the channel into the contact list.
    fn drain_events(&mut self) {
        while let Ok(event) = self.collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _) = event {
                let a = self.colliders.get(h1).map(|c| ObjectId(c.user_data as u64));
                let b = self.colliders.get(h2).map(|c| ObjectId(c.user_data as u64));
                if let (Some(a), Some(b)) = (a, b) {
                    self.contacts.push((a, b));
                }
            }
        }
        // Contact force events are unused; keep the channel from backing up.
        while self.force_recv.try_recv().is_ok() {}
    }

    /// Take the contact pairs recorded since the last call.
    pub fn drain_contacts(&mut self) -> Vec<(ObjectId, ObjectId)> {
        std::mem::take(&mut self.contacts)
    }

    /// Current body translation.
    pub fn body_position(&self, handle: RigidBodyHandle) -> Vec2 {
        self.bodies.get(handle).map_or(Vec2::ZERO, |b| {
            let t = b.translation();
            Vec2::new(t.x, t.y)
        })
    }

    /// Current body rotation in radians.
    pub fn body_rotation(&self, handle: RigidBodyHandle) -> f32 {
        self.bodies.get(handle).map_or(0.0, |b| b.rotation().angle())
    }

    /// Current linear velocity.
    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Vec2 {
        self.bodies.get(handle).map_or(Vec2::ZERO, |b| {
            let v = b.linvel();
            Vec2::new(v.x, v.y)
        })
    }

    /// Set linear velocity, waking the body.
    pub fn set_body_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    /// Cast a ray from `origin` toward `to`, returning the closest
    /// non-particulate hit. `exclude` filters out the caster's own collider.
    pub fn cast_ray(
        &self,
        origin: Vec2,
        to: Vec2,
        exclude: Option<ColliderHandle>,
    ) -> Option<(ObjectId, f32)> {
        let dir = to - origin;
        let len = dir.length();
        if len <= f32::EPSILON {
            return None;
        }

        let ray = Ray::new(point![origin.x, origin.y], vector![dir.x / len, dir.y / len]);
        let predicate = |_: ColliderHandle, collider: &Collider| {
            collider.user_data & PARTICULATE_BIT == 0
        };
        let mut filter = QueryFilter::new().predicate(&predicate);
        if let Some(handle) = exclude {
            filter = filter.exclude_collider(handle);
        }

        self.query_pipeline
            .cast_ray(&self.bodies, &self.colliders, &ray, len, true, filter)
            .map(|(handle, toi)| (ObjectId(self.colliders[handle].user_data as u64), toi))
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
