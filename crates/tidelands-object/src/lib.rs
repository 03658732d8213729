//! Object descriptors and the physics-body runtime binding.
//!
//! An [`AbstractObject`] is the flat, serializable description of a game
//! entity. While the entity is active in the simulated world it is wrapped
//! by an [`ObjectRuntime`], which exclusively owns one physics body inside
//! the shared [`PhysicsWorld`]. The body never outlives its runtime.

pub mod descriptor;
pub mod physics;
pub mod runtime;

pub use descriptor::{AbstractObject, Capabilities, ObjectFlags, ObjectKind};
pub use physics::{PhysicsWorld, FIXED_DT, MAX_SUBSTEPS};
pub use runtime::ObjectRuntime;

use serde::{Deserialize, Serialize};

/// World-unique identifier of an active object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ObjectId(pub u64);
