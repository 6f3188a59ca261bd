pub mod assets;
pub mod constants;
pub mod error;
pub mod ids;
pub mod impulse;
pub mod loader;
pub mod physics;
pub mod proxy;
pub mod rapier;

pub use rapier3d;

pub use assets::{AssetDescriptor, AssetRegistry};
pub use constants::{
    ASSET_ID_PREFIX, DEFAULT_FAILURE_POLICY, GRAVITY_MPS2, ID_SUFFIX_RANGE, IMPULSE_STRENGTH,
};
pub use error::{AssetError, LoadError, ProxyError};
pub use futures::future::BoxFuture;
pub use ids::IdAllocator;
pub use impulse::{
    BodyRegistry, DynamicBodyEntry, ImpulseOutcome, MeshRef, SceneMesh, apply_default_impulse,
    apply_impulse, impulse_direction,
};
pub use loader::{
    FailurePolicy, ModuleFuture, ModuleKind, ModuleLoader, ModuleSource, ModuleState,
    PhysicsRuntime,
};
pub use physics::{PhysicsWorld, RapierModule, RapierSource};
pub use proxy::{Member, PhysicsProxy, ProxyState};
pub use rapier::{ColliderShapeDef, WorldStaticDef, collider_from_def};
