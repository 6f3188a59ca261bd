//! The Rapier physics module and the steppable scene world.
//!
//! [`RapierSource`] plays the part of the asynchronous import: it produces a
//! [`RapierModule`], whose [`PhysicsRuntime::init`] must complete before the module is
//! handed out through the proxy. The module's `world` constructor builds a
//! [`PhysicsWorld`] for a given gravity vector.
//!
//! Design notes
//! - The world owns every Rapier set and pipeline needed for dynamics. Scene code keeps
//!   only `RigidBodyHandle`s (see `impulse::BodyRegistry`).
//! - Each dynamic body stores its numeric scene ID in `user_data`.
//! - Mass properties are recomputed right after a collider is attached, so impulses
//!   applied before the first step already see the asset's mass.

use crate::{
    assets::AssetDescriptor,
    error::LoadError,
    loader::{ModuleSource, PhysicsRuntime},
    rapier::{WorldStaticDef, collider_from_def},
};
use futures::future::{BoxFuture, FutureExt};
use log::{debug, info};
use rapier3d::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Produces the Rapier physics module.
#[derive(Clone, Copy, Debug, Default)]
pub struct RapierSource;

impl ModuleSource for RapierSource {
    type Module = RapierModule;

    fn load(&self) -> BoxFuture<'static, Result<RapierModule, LoadError>> {
        async { Ok(RapierModule::new()) }.boxed()
    }
}

/// Loaded physics module. Becomes usable once its runtime is started.
#[derive(Debug)]
pub struct RapierModule {
    integration_parameters: IntegrationParameters,
    started: AtomicBool,
    init_count: AtomicUsize,
}

impl RapierModule {
    pub fn new() -> Self {
        Self::with_integration_parameters(IntegrationParameters::default())
    }

    pub fn with_integration_parameters(integration_parameters: IntegrationParameters) -> Self {
        Self {
            integration_parameters,
            started: AtomicBool::new(false),
            init_count: AtomicUsize::new(0),
        }
    }

    /// Construct a world with the given gravity vector.
    pub fn world(&self, gravity: Vector<f32>) -> PhysicsWorld {
        PhysicsWorld::new(gravity, self.integration_parameters)
    }

    pub fn integration_parameters(&self) -> IntegrationParameters {
        self.integration_parameters
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// How many times the runtime start actually ran.
    pub fn init_count(&self) -> usize {
        self.init_count.load(Ordering::Acquire)
    }
}

impl Default for RapierModule {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsRuntime for RapierModule {
    fn init(&self) -> BoxFuture<'_, Result<(), LoadError>> {
        async move {
            if self.started.swap(true, Ordering::AcqRel) {
                debug!("rapier runtime already started");
                return Ok(());
            }

            let dt = self.integration_parameters.dt;
            if !(dt.is_finite() && dt > 0.0) {
                self.started.store(false, Ordering::Release);
                return Err(LoadError::init(format!("invalid timestep {dt}")));
            }

            self.init_count.fetch_add(1, Ordering::AcqRel);
            info!("rapier runtime started (dt = {dt:.4}s)");
            Ok(())
        }
        .boxed()
    }
}

/// Dynamic Rapier world for the scene.
pub struct PhysicsWorld {
    pub gravity: Vector<f32>,
    pub integration_parameters: IntegrationParameters,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    island_manager: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pipeline: PhysicsPipeline,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector<f32>, integration_parameters: IntegrationParameters) -> Self {
        Self {
            gravity,
            integration_parameters,
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            pipeline: PhysicsPipeline::new(),
        }
    }

    /// Advance the simulation by one `integration_parameters.dt`.
    pub fn step(&mut self) {
        // No hooks or event handlers.
        let hooks = ();
        let events = ();

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &hooks,
            &events,
        );
    }

    /// Insert a fixed body with an attached collider for an immutable scene piece.
    pub fn insert_static(&mut self, def: &WorldStaticDef) -> RigidBodyHandle {
        let rb = RigidBodyBuilder::fixed()
            .pose(def.pose())
            .user_data(def.id as u128)
            .build();
        let handle = self.bodies.insert(rb);

        let collider = collider_from_def(&def.shape, 1.0).build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Insert a dynamic body for an asset at `translation`, tagged with `id`.
    pub fn spawn_asset(
        &mut self,
        id: u64,
        descriptor: &AssetDescriptor,
        translation: Vector<f32>,
    ) -> RigidBodyHandle {
        let rb = RigidBodyBuilder::dynamic()
            .translation(translation)
            .user_data(id as u128)
            .build();
        let handle = self.bodies.insert(rb);

        let collider = descriptor.collider().build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        debug!("spawned body {id} from {}", descriptor.source_path);
        handle
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vector<f32>> {
        self.bodies.get(handle).map(|rb| *rb.translation())
    }

    /// Scene ID stored on the body by [`PhysicsWorld::spawn_asset`].
    pub fn body_id(&self, handle: RigidBodyHandle) -> Option<u64> {
        self.bodies.get(handle).map(|rb| rb.user_data as u64)
    }
}
