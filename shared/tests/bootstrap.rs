use futures::future::{BoxFuture, FutureExt};
use nalgebra::{Isometry3, Point3, Vector3};
use scene_shared::{
    AssetRegistry, BodyRegistry, GRAVITY_MPS2, IMPULSE_STRENGTH, IdAllocator, ImpulseOutcome,
    LoadError, MeshRef, ModuleKind, ModuleLoader, ModuleSource, ModuleState, PhysicsProxy,
    ProxyError, RapierSource, WorldStaticDef, apply_default_impulse,
};
use std::sync::Arc;

/// Render settings standing in for the render module.
#[derive(Debug, PartialEq)]
struct RenderProfile {
    exposure: f32,
}

struct ProfileSource;

impl ModuleSource for ProfileSource {
    type Module = RenderProfile;

    fn load(&self) -> BoxFuture<'static, Result<RenderProfile, LoadError>> {
        async { Ok(RenderProfile { exposure: 1.0 }) }.boxed()
    }
}

struct BrokenPhysics;

impl ModuleSource for BrokenPhysics {
    type Module = scene_shared::RapierModule;

    fn load(&self) -> BoxFuture<'static, Result<Self::Module, LoadError>> {
        async { Err(LoadError::import(ModuleKind::Physics, "wasm fetch failed")) }.boxed()
    }
}

#[test]
fn scene_boots_and_reacts_to_a_click() {
    let ids = IdAllocator::new();
    let assets = AssetRegistry::builtin().expect("built-in catalog is valid");
    let loader = Arc::new(ModuleLoader::new(ProfileSource, RapierSource));
    let proxy = PhysicsProxy::new(Arc::clone(&loader));

    // Scene construction holds the proxy before anything has loaded.
    assert!(matches!(
        proxy.world(Vector3::zeros()),
        Err(ProxyError::Uninitialized { .. })
    ));
    assert_eq!(loader.state(ModuleKind::Physics), ModuleState::Unloaded);

    let (profile, physics) = pollster::block_on(async {
        futures::join!(loader.load_render_module(), proxy.init())
    });
    assert_eq!(profile.unwrap().exposure, 1.0);
    let physics = physics.expect("physics starts");
    assert_eq!(physics.init_count(), 1);

    let mut world = proxy
        .world(Vector3::new(0.0, -GRAVITY_MPS2, 0.0))
        .expect("proxy unlocked");
    world.insert_static(&WorldStaticDef::ground(0, 0.0));

    let mut bodies = BodyRegistry::new();
    let axe = assets.get("AXE").expect("AXE is built in");
    let id = ids.generate_numeric_id();
    let handle = world.spawn_asset(id, axe, Vector3::new(0.0, 1.0, 0.0));
    bodies.push("axe_1", handle);
    assert_eq!(world.body_id(handle), Some(id));

    // Click from a camera in front of the axe.
    let camera = Isometry3::translation(0.0, 1.0, 5.0);
    let mesh = MeshRef::new("axe_1", Point3::new(0.0, 1.0, 0.0));
    let outcome = apply_default_impulse(&mesh, &camera, &bodies, &mut world.bodies);
    assert_eq!(
        outcome,
        ImpulseOutcome::Applied {
            body: handle,
            impulse: Vector3::new(0.0, 0.0, -IMPULSE_STRENGTH),
        }
    );

    world.step();
    let moved = world.translation(handle).unwrap();
    assert!(moved.z < 0.0, "axe should move away from the camera: {moved:?}");

    // Decorative meshes have no body.
    let floor = MeshRef::new("floor", Point3::origin());
    assert_eq!(
        apply_default_impulse(&floor, &camera, &bodies, &mut world.bodies),
        ImpulseOutcome::NoBody
    );

    // A second init is a no-op on the same module.
    let again = pollster::block_on(proxy.init()).unwrap();
    assert!(Arc::ptr_eq(&again, &physics));
    assert_eq!(physics.init_count(), 1);
}

#[test]
fn physics_load_failure_keeps_the_proxy_locked() {
    let loader = Arc::new(ModuleLoader::new(ProfileSource, BrokenPhysics));
    let proxy = PhysicsProxy::new(Arc::clone(&loader));

    let err = pollster::block_on(proxy.init()).unwrap_err();
    assert!(err.to_string().contains("wasm fetch failed"));
    assert_eq!(loader.state(ModuleKind::PhysicsRuntime), ModuleState::Failed);

    assert!(matches!(
        proxy.access("World"),
        Err(ProxyError::Uninitialized { member }) if member == "World"
    ));
    // The render module is unaffected.
    assert!(pollster::block_on(loader.load_render_module()).is_ok());
}
