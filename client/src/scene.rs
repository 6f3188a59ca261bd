//! Stand-in meshes for every catalog asset.
//!
//! Meshes are spawned at startup, before physics is ready; their bodies are attached
//! later by the physics plugin. Each mesh is named `<asset>_<id>` so a pick can be
//! traced back to its body.

use crate::physics::SceneRuntime;
use bevy::prelude::*;
use scene_shared::ColliderShapeDef;

/// Spacing between assets along X (meters).
const ASSET_SPACING: f32 = 1.5;
/// Height assets are dropped from.
const DROP_HEIGHT: f32 = 2.0;

const PALETTE: [Color; 5] = [
    Color::srgb(0.49, 0.56, 1.0),
    Color::srgb(0.93, 0.55, 0.27),
    Color::srgb(0.36, 0.78, 0.49),
    Color::srgb(0.85, 0.33, 0.45),
    Color::srgb(0.91, 0.84, 0.42),
];

#[derive(Component, Clone, Debug)]
pub struct SceneAsset {
    /// Catalog name.
    pub asset: String,
    /// Numeric ID, stored on the rigid body.
    pub id: u64,
    /// String ID for logs.
    pub instance_id: String,
    /// Spawn position, used by scene reset.
    pub home: Vec3,
}

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_assets);
}

pub(crate) fn spawn_assets(
    mut commands: Commands,
    runtime: Option<Res<SceneRuntime>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(runtime) = runtime else {
        return;
    };
    let count = runtime.assets.len();

    for (index, (name, descriptor)) in runtime.assets.iter().enumerate() {
        let Some(mesh) = stand_in_mesh(&descriptor.collider, descriptor.scale) else {
            continue;
        };
        let id = runtime.ids.generate_numeric_id();
        let instance_id = runtime.ids.generate_asset_id();
        let home = Vec3::new(row_offset(index, count), DROP_HEIGHT, 0.0);
        debug!("spawning {name} as {instance_id} ({})", descriptor.source_path);

        commands.spawn((
            Name::new(format!("{}_{id}", name.to_lowercase())),
            SceneAsset {
                asset: name.to_owned(),
                id,
                instance_id,
                home,
            },
            Pickable::default(),
            Mesh3d(meshes.add(mesh)),
            MeshMaterial3d(materials.add(PALETTE[index % PALETTE.len()])),
            Transform::from_translation(home),
        ));
    }
}

/// X offset of the `index`-th of `count` assets, centered on the origin.
fn row_offset(index: usize, count: usize) -> f32 {
    (index as f32 - (count.saturating_sub(1)) as f32 / 2.0) * ASSET_SPACING
}

/// Primitive mesh matching the scaled collider. Planes have no stand-in.
fn stand_in_mesh(shape: &ColliderShapeDef, scale: f32) -> Option<Mesh> {
    let mesh = match *shape {
        ColliderShapeDef::Plane { .. } => return None,
        ColliderShapeDef::Cuboid {
            half_extents: [x, y, z],
        } => Mesh::from(Cuboid::new(2.0 * x * scale, 2.0 * y * scale, 2.0 * z * scale)),
        ColliderShapeDef::Sphere { radius } => Mesh::from(Sphere::new(radius * scale)),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => Mesh::from(Capsule3d::new(radius * scale, 2.0 * half_height * scale)),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => Mesh::from(Cylinder::new(radius * scale, 2.0 * half_height * scale)),
        ColliderShapeDef::RoundCuboid {
            half_extents: [x, y, z],
            border_radius: r,
        } => Mesh::from(Cuboid::new(
            2.0 * (x + r) * scale,
            2.0 * (y + r) * scale,
            2.0 * (z + r) * scale,
        )),
    };
    Some(mesh)
}
