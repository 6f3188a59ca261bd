//! Click impulses: correlate a rendered mesh with its rigid body and push it away
//! from a source transform (typically the camera).
//!
//! The body registry is an ordered list of `(mesh name, body handle)` pairs owned by the
//! scene container. Lookup takes the first entry with a matching name. Meshes without a
//! body (decorative geometry) are a silent no-op, not an error.

use crate::constants::{IMPULSE_DIRECTION_EPS_SQ, IMPULSE_STRENGTH};
use log::trace;
use nalgebra::{Isometry3, Point3, Vector3};
use rapier3d::prelude::{RigidBodyHandle, RigidBodySet};

/// Render-side mesh as seen by the impulse utility.
pub trait SceneMesh {
    /// Name unique within the scene.
    fn name(&self) -> &str;
    fn world_position(&self) -> Point3<f32>;
}

/// Plain mesh reference for callers without their own scene-graph type.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRef {
    pub name: String,
    pub position: Point3<f32>,
}

impl MeshRef {
    pub fn new(name: impl Into<String>, position: Point3<f32>) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

impl SceneMesh for MeshRef {
    fn name(&self) -> &str {
        &self.name
    }

    fn world_position(&self) -> Point3<f32> {
        self.position
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DynamicBodyEntry {
    pub mesh_name: String,
    pub body: RigidBodyHandle,
}

/// Ordered mesh → body pairs.
#[derive(Clone, Debug, Default)]
pub struct BodyRegistry {
    entries: Vec<DynamicBodyEntry>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mesh_name: impl Into<String>, body: RigidBodyHandle) {
        self.entries.push(DynamicBodyEntry {
            mesh_name: mesh_name.into(),
            body,
        });
    }

    /// First entry registered under `mesh_name`.
    pub fn find(&self, mesh_name: &str) -> Option<&DynamicBodyEntry> {
        self.entries.iter().find(|e| e.mesh_name == mesh_name)
    }

    /// Remove every entry for `mesh_name`, returning how many were dropped.
    pub fn remove(&mut self, mesh_name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.mesh_name != mesh_name);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DynamicBodyEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImpulseOutcome {
    Applied {
        body: RigidBodyHandle,
        impulse: Vector3<f32>,
    },
    /// The mesh has no live rigid body.
    NoBody,
}

/// Unit vector from `source` toward `target`, or zero when the two coincide.
pub fn impulse_direction(source: &Point3<f32>, target: &Point3<f32>) -> Vector3<f32> {
    let delta = target - source;
    if delta.norm_squared() <= IMPULSE_DIRECTION_EPS_SQ {
        return Vector3::zeros();
    }
    delta.normalize()
}

/// Push the body paired with `target` away from `source` with `strength`, waking it up.
pub fn apply_impulse(
    target: &impl SceneMesh,
    source: &Isometry3<f32>,
    registry: &BodyRegistry,
    bodies: &mut RigidBodySet,
    strength: f32,
) -> ImpulseOutcome {
    let name = target.name();
    let Some(entry) = registry.find(name) else {
        trace!("no rigid body registered for mesh `{name}`");
        return ImpulseOutcome::NoBody;
    };
    let Some(body) = bodies.get_mut(entry.body) else {
        trace!("rigid body for mesh `{name}` was removed");
        return ImpulseOutcome::NoBody;
    };

    let source_position = Point3::from(source.translation.vector);
    let direction = impulse_direction(&source_position, &target.world_position());
    let impulse = direction * strength;
    body.apply_impulse(impulse, true);

    ImpulseOutcome::Applied {
        body: entry.body,
        impulse,
    }
}

/// [`apply_impulse`] with [`IMPULSE_STRENGTH`].
pub fn apply_default_impulse(
    target: &impl SceneMesh,
    source: &Isometry3<f32>,
    registry: &BodyRegistry,
    bodies: &mut RigidBodySet,
) -> ImpulseOutcome {
    apply_impulse(target, source, registry, bodies, IMPULSE_STRENGTH)
}
