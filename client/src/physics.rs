//! Bootstrap and stepping of the physics module inside the Bevy app.
//!
//! Startup order:
//! 1. `PreStartup` builds the [`SceneRuntime`] (ID allocator, asset catalog, module
//!    loader, physics proxy). Nothing is loaded yet.
//! 2. `Startup` systems build the scene against the proxy and spawn the physics init
//!    on the async compute pool.
//! 3. Once the init settles, the world is created through the proxy and bodies are
//!    attached to every scene asset spawned so far.

use crate::{
    config::SceneConfig,
    convert::{from_rotation, from_vector, to_vector},
    render::RenderProfileSource,
    scene::SceneAsset,
};
use bevy::{
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};
use scene_shared::{
    AssetError, AssetRegistry, BodyRegistry, GRAVITY_MPS2, IdAllocator, LoadError, ModuleLoader,
    PhysicsProxy, PhysicsWorld, RapierModule, RapierSource, WorldStaticDef,
    rapier3d::prelude::RigidBodyHandle,
};
use std::sync::Arc;

pub type SceneLoader = ModuleLoader<RenderProfileSource, RapierSource>;
pub type SceneProxy = PhysicsProxy<RenderProfileSource, RapierSource>;

/// Scene ID of the ground collider.
const GROUND_ID: u32 = 0;

/// Long-lived services shared by the scene systems.
#[derive(Resource)]
pub struct SceneRuntime {
    pub loader: Arc<SceneLoader>,
    pub proxy: Arc<SceneProxy>,
    pub ids: IdAllocator,
    pub assets: AssetRegistry,
}

impl SceneRuntime {
    pub fn from_config(config: &SceneConfig) -> Result<Self, AssetError> {
        let assets = match &config.catalog {
            Some(path) => AssetRegistry::load_ron(path)?,
            None => AssetRegistry::builtin()?,
        };
        let loader = Arc::new(
            ModuleLoader::new(RenderProfileSource::default(), RapierSource)
                .with_policy(config.failure_policy()),
        );
        let proxy = Arc::new(PhysicsProxy::new(Arc::clone(&loader)));

        Ok(Self {
            loader,
            proxy,
            ids: IdAllocator::new(),
            assets,
        })
    }
}

/// The live world and the mesh → body pairs. `world` is `None` until physics is ready.
#[derive(Resource, Default)]
pub struct PhysicsScene {
    pub world: Option<PhysicsWorld>,
    pub bodies: BodyRegistry,
}

/// Rigid body driving this entity's transform.
#[derive(Component, Clone, Copy, Debug)]
pub struct PhysicsBody(pub RigidBodyHandle);

#[derive(Component)]
struct PhysicsInitTask(Task<Result<Arc<RapierModule>, LoadError>>);

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<PhysicsScene>();

    app.add_systems(PreStartup, setup_runtime);
    app.add_systems(Startup, start_physics_init);
    app.add_systems(
        Update,
        (
            poll_physics_init,
            (attach_bodies, sync_transforms)
                .chain()
                .run_if(physics_ready),
        )
            .chain(),
    );
    app.add_systems(FixedUpdate, step_world.run_if(physics_ready));
}

pub fn physics_ready(scene: Res<PhysicsScene>) -> bool {
    scene.world.is_some()
}

fn setup_runtime(
    mut commands: Commands,
    config: Res<SceneConfig>,
    mut exit: MessageWriter<AppExit>,
) {
    match SceneRuntime::from_config(&config) {
        Ok(runtime) => {
            info!("asset catalog: {} entries", runtime.assets.len());
            commands.insert_resource(runtime);
        }
        Err(err) => {
            error!("failed to load asset catalog: {err}");
            exit.write(AppExit::error());
        }
    }
}

fn start_physics_init(mut commands: Commands, runtime: Option<Res<SceneRuntime>>) {
    let Some(runtime) = runtime else {
        return;
    };
    let task = AsyncComputeTaskPool::get().spawn(init_physics(&runtime));
    commands.spawn(PhysicsInitTask(task));
}

/// Runs the proxy's initializer; the proxy is `Ready` once this resolves `Ok`.
fn init_physics(
    runtime: &SceneRuntime,
) -> impl Future<Output = Result<Arc<RapierModule>, LoadError>> + Send + 'static {
    let proxy = Arc::clone(&runtime.proxy);
    async move { proxy.init().await }
}

fn poll_physics_init(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut PhysicsInitTask)>,
    runtime: Option<Res<SceneRuntime>>,
    mut scene: ResMut<PhysicsScene>,
    mut exit: MessageWriter<AppExit>,
) {
    let Some(runtime) = runtime else {
        return;
    };
    for (entity, mut task) in &mut tasks {
        let Some(result) = block_on(future::poll_once(&mut task.0)) else {
            continue;
        };
        commands.entity(entity).despawn();

        if let Err(err) = result {
            error!("physics initialization failed: {err}");
            exit.write(AppExit::error());
            continue;
        }

        match runtime.proxy.world(to_vector(Vec3::NEG_Y * GRAVITY_MPS2)) {
            Ok(mut world) => {
                world.insert_static(&WorldStaticDef::ground(GROUND_ID, 0.0));
                scene.world = Some(world);
                info!("physics world ready");
            }
            Err(err) => {
                error!("physics proxy still locked after init: {err}");
                exit.write(AppExit::error());
            }
        }
    }
}

fn attach_bodies(
    mut commands: Commands,
    runtime: Res<SceneRuntime>,
    mut scene: ResMut<PhysicsScene>,
    pending: Query<(Entity, &Name, &SceneAsset, &Transform), Without<PhysicsBody>>,
) {
    let PhysicsScene { world, bodies } = &mut *scene;
    let Some(world) = world.as_mut() else {
        return;
    };

    for (entity, name, asset, transform) in &pending {
        let Some(descriptor) = runtime.assets.get(&asset.asset) else {
            warn!("`{name}` refers to unknown asset `{}`", asset.asset);
            continue;
        };
        let handle = world.spawn_asset(asset.id, descriptor, to_vector(transform.translation));
        bodies.push(name.as_str(), handle);
        debug!("{name} ({}) attached to {handle:?}", asset.instance_id);
        commands.entity(entity).insert(PhysicsBody(handle));
    }
}

fn step_world(mut scene: ResMut<PhysicsScene>, time: Res<Time>) {
    let Some(world) = scene.world.as_mut() else {
        return;
    };
    world.integration_parameters.dt = time.delta_secs();
    world.step();
}

fn sync_transforms(scene: Res<PhysicsScene>, mut bodies: Query<(&PhysicsBody, &mut Transform)>) {
    let Some(world) = scene.world.as_ref() else {
        return;
    };
    for (body, mut transform) in &mut bodies {
        let Some(rb) = world.body(body.0) else {
            continue;
        };
        transform.translation = from_vector(rb.translation());
        transform.rotation = from_rotation(rb.rotation());
    }
}
