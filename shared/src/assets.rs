//! Catalog of loadable scene assets and their physical properties.
//!
//! A descriptor pairs the model path the renderer loads with the values the physics
//! world needs: render scale, mass, restitution and a collider shape in model units.
//! Descriptors are validated when they enter a registry; a registry never holds an
//! out-of-range restitution, a negative mass or a non-positive scale.
//!
//! Catalog files are RON maps from asset name to descriptor:
//!
//! ```text
//! {
//!     "AXE": (
//!         source_path: "models/axe.glb",
//!         scale: 20.0,
//!         mass: 5.0,
//!         restitution: 0.1,
//!         collider: Cuboid(half_extents: (0.012, 0.04, 0.003)),
//!     ),
//! }
//! ```

use crate::{
    error::AssetError,
    rapier::{ColliderShapeDef, collider_from_def},
};
use rapier3d::prelude::ColliderBuilder;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Model path, relative to the asset root.
    pub source_path: String,
    /// Uniform render scale; also applied to the collider.
    pub scale: f32,
    /// Kilograms. Zero is allowed.
    pub mass: f32,
    /// Bounce energy coefficient in `[0, 1]`.
    pub restitution: f32,
    /// Collider shape in model units.
    pub collider: ColliderShapeDef,
}

impl AssetDescriptor {
    pub fn validate(&self, name: &str) -> Result<(), AssetError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(AssetError::InvalidScale {
                name: name.to_owned(),
                scale: self.scale,
            });
        }
        if !(self.mass.is_finite() && self.mass >= 0.0) {
            return Err(AssetError::InvalidMass {
                name: name.to_owned(),
                mass: self.mass,
            });
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(AssetError::InvalidRestitution {
                name: name.to_owned(),
                restitution: self.restitution,
            });
        }
        if matches!(self.collider, ColliderShapeDef::Plane { .. }) || !self.collider.is_valid() {
            return Err(AssetError::InvalidShape {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    /// Collider scaled by `scale`, carrying the descriptor's mass and restitution.
    pub fn collider(&self) -> ColliderBuilder {
        collider_from_def(&self.collider, self.scale)
            .mass(self.mass)
            .restitution(self.restitution)
    }
}

/// Validated name → descriptor lookup. Iteration is in name order.
#[derive(Clone, Debug, Default)]
pub struct AssetRegistry {
    assets: BTreeMap<String, AssetDescriptor>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor, rejecting invalid values and duplicate names.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        descriptor: AssetDescriptor,
    ) -> Result<(), AssetError> {
        let name = name.into();
        descriptor.validate(&name)?;
        if self.assets.contains_key(&name) {
            return Err(AssetError::Duplicate(name));
        }
        self.assets.insert(name, descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AssetDescriptor> {
        self.assets.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssetDescriptor)> {
        self.assets.iter().map(|(name, desc)| (name.as_str(), desc))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Parse and validate a RON catalog.
    pub fn from_ron_str(text: &str) -> Result<Self, AssetError> {
        let raw: BTreeMap<String, AssetDescriptor> = ron::from_str(text)?;
        let mut registry = Self::new();
        for (name, descriptor) in raw {
            registry.register(name, descriptor)?;
        }
        Ok(registry)
    }

    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// The catalog shipped with the scene.
    pub fn builtin() -> Result<Self, AssetError> {
        let mut registry = Self::new();
        for (name, descriptor) in builtin_descriptors() {
            registry.register(name, descriptor)?;
        }
        Ok(registry)
    }
}

fn builtin_descriptors() -> Vec<(&'static str, AssetDescriptor)> {
    let asset = |path: &str, scale: f32, mass: f32, restitution: f32, collider| AssetDescriptor {
        source_path: path.to_owned(),
        scale,
        mass,
        restitution,
        collider,
    };

    vec![
        (
            "AXE",
            asset(
                "models/axe.glb",
                20.0,
                5.0,
                0.1,
                ColliderShapeDef::Cuboid {
                    half_extents: [0.012, 0.04, 0.003],
                },
            ),
        ),
        (
            "CUBE",
            asset(
                "models/cube.glb",
                1.0,
                1.0,
                0.3,
                ColliderShapeDef::Cuboid {
                    half_extents: [0.5, 0.5, 0.5],
                },
            ),
        ),
        (
            "BALL",
            asset(
                "models/ball.glb",
                0.5,
                0.45,
                0.8,
                ColliderShapeDef::Sphere { radius: 0.5 },
            ),
        ),
        (
            "MUG",
            asset(
                "models/mug.glb",
                10.0,
                0.35,
                0.2,
                ColliderShapeDef::CylinderY {
                    radius: 0.04,
                    half_height: 0.05,
                },
            ),
        ),
        (
            "BOOK",
            asset(
                "models/book.glb",
                5.0,
                1.2,
                0.05,
                ColliderShapeDef::RoundCuboid {
                    half_extents: [0.03, 0.045, 0.008],
                    border_radius: 0.001,
                },
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(mass: f32, restitution: f32) -> AssetDescriptor {
        AssetDescriptor {
            source_path: "models/cube.glb".into(),
            scale: 1.0,
            mass,
            restitution,
            collider: ColliderShapeDef::Cuboid {
                half_extents: [0.5, 0.5, 0.5],
            },
        }
    }

    #[test]
    fn builtin_axe_has_documented_properties() {
        let registry = AssetRegistry::builtin().unwrap();
        let axe = registry.get("AXE").expect("AXE is built in");

        assert_eq!(axe.scale, 20.0);
        assert_eq!(axe.mass, 5.0);
        assert_eq!(axe.restitution, 0.1);
    }

    #[test]
    fn unknown_asset_is_absent() {
        let registry = AssetRegistry::builtin().unwrap();
        assert!(registry.get("SWORD").is_none());
        assert!(!registry.contains("SWORD"));
    }

    #[test]
    fn register_rejects_out_of_range_values() {
        let mut registry = AssetRegistry::new();

        assert!(matches!(
            registry.register("bouncy", cube(1.0, 1.5)),
            Err(AssetError::InvalidRestitution { .. })
        ));
        assert!(matches!(
            registry.register("negative", cube(-1.0, 0.5)),
            Err(AssetError::InvalidMass { .. })
        ));
        let mut tiny = cube(1.0, 0.5);
        tiny.scale = 0.0;
        assert!(matches!(
            registry.register("tiny", tiny),
            Err(AssetError::InvalidScale { .. })
        ));
        let mut flat = cube(1.0, 0.5);
        flat.collider = ColliderShapeDef::Plane {
            offset_along_normal: 0.0,
        };
        assert!(matches!(
            registry.register("flat", flat),
            Err(AssetError::InvalidShape { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn register_accepts_boundary_values_and_rejects_duplicates() {
        let mut registry = AssetRegistry::new();
        registry.register("weightless", cube(0.0, 0.0)).unwrap();
        registry.register("perfect", cube(1.0, 1.0)).unwrap();

        assert!(matches!(
            registry.register("perfect", cube(2.0, 0.5)),
            Err(AssetError::Duplicate(name)) if name == "perfect"
        ));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("perfect").unwrap().mass, 1.0);
    }

    #[test]
    fn ron_catalog_is_parsed_and_validated() {
        let text = r#"{
            "CRATE": (
                source_path: "models/crate.glb",
                scale: 2.0,
                mass: 12.0,
                restitution: 0.25,
                collider: Cuboid(half_extents: (0.5, 0.5, 0.5)),
            ),
            "PEBBLE": (
                source_path: "models/pebble.glb",
                scale: 1.0,
                mass: 0.1,
                restitution: 0.6,
                collider: Sphere(radius: 0.05),
            ),
        }"#;

        let registry = AssetRegistry::from_ron_str(text).unwrap();
        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["CRATE", "PEBBLE"]);
        assert_eq!(registry.get("CRATE").unwrap().mass, 12.0);
    }

    #[test]
    fn ron_catalog_with_invalid_restitution_is_rejected() {
        let text = r#"{
            "BAD": (
                source_path: "models/bad.glb",
                scale: 1.0,
                mass: 1.0,
                restitution: 2.0,
                collider: Sphere(radius: 0.5),
            ),
        }"#;

        assert!(matches!(
            AssetRegistry::from_ron_str(text),
            Err(AssetError::InvalidRestitution { .. })
        ));
        assert!(matches!(
            AssetRegistry::from_ron_str("{ \"BROKEN\": ( }"),
            Err(AssetError::Parse(_))
        ));
    }

    #[test]
    fn collider_applies_scale_mass_and_restitution() {
        let registry = AssetRegistry::builtin().unwrap();
        let axe = registry.get("AXE").unwrap();
        let collider = axe.collider().build();

        assert_eq!(collider.restitution(), 0.1);
        assert!((collider.mass() - 5.0).abs() < 1.0e-4);
        let he = collider.shape().as_cuboid().unwrap().half_extents;
        assert!((he.y - 0.8).abs() < 1.0e-6);
    }
}
