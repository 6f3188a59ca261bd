use rapier3d::{na::UnitQuaternion, prelude::*};
use serde::{Deserialize, Serialize};

/// Definition of an immutable scene collider (ground, walls, shelves).
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    pub id: u32,
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
}

impl WorldStaticDef {
    /// Horizontal ground at `height`, facing +Y.
    pub fn ground(id: u32, height: f32) -> Self {
        Self {
            id,
            translation: vector![0.0, height, 0.0],
            rotation: UnitQuaternion::identity(),
            shape: ColliderShapeDef::Plane {
                offset_along_normal: 0.0,
            },
        }
    }

    pub fn pose(&self) -> Isometry<f32> {
        Isometry::from_parts(self.translation.into(), self.rotation)
    }
}

/// Supported collider shapes, in model units.
///
/// Dimensions are multiplied by the asset scale when the collider is built, except for
/// `Plane`, which is infinite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space).
    ///
    /// The plane normal is derived from the parent pose as `rotation * +Y`.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents.
    Cuboid { half_extents: [f32; 3] },

    Sphere { radius: f32 },

    /// Y-aligned capsule.
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder.
    CylinderY { radius: f32, half_height: f32 },

    /// Rounded cuboid.
    ///
    /// `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: [f32; 3],
        border_radius: f32,
    },
}

impl ColliderShapeDef {
    /// Every dimension is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        match self {
            ColliderShapeDef::Plane {
                offset_along_normal,
            } => offset_along_normal.is_finite(),
            ColliderShapeDef::Cuboid { half_extents } => half_extents.iter().all(|&v| positive(v)),
            ColliderShapeDef::Sphere { radius } => positive(*radius),
            ColliderShapeDef::CapsuleY {
                radius,
                half_height,
            }
            | ColliderShapeDef::CylinderY {
                radius,
                half_height,
            } => positive(*radius) && positive(*half_height),
            ColliderShapeDef::RoundCuboid {
                half_extents,
                border_radius,
            } => half_extents.iter().all(|&v| positive(v)) && positive(*border_radius),
        }
    }
}

/// Build a Rapier collider for `shape` scaled uniformly by `scale`.
///
/// The collider is created with identity local transform; its pose comes from the
/// parent rigid-body.
pub fn collider_from_def(shape: &ColliderShapeDef, scale: f32) -> ColliderBuilder {
    match shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // Local half-space along +Y, shifted by the offset. The parent pose rotates it.
            ColliderBuilder::halfspace(Vector::y_axis()).translation(vector![
                0.0,
                *offset_along_normal,
                0.0
            ])
        }

        ColliderShapeDef::Cuboid { half_extents: [x, y, z] } => {
            ColliderBuilder::cuboid(x * scale, y * scale, z * scale)
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(radius * scale),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(half_height * scale, radius * scale),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(half_height * scale, radius * scale),

        ColliderShapeDef::RoundCuboid {
            half_extents: [x, y, z],
            border_radius,
        } => ColliderBuilder::round_cuboid(
            x * scale,
            y * scale,
            z * scale,
            border_radius * scale,
        ),
    }
}
