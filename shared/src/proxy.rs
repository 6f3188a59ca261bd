//! Lazily initialized access to the physics module.
//!
//! A [`PhysicsProxy`] is handed out during synchronous startup, before the physics
//! module exists. Until [`PhysicsProxy::init`] resolves, reading any member fails with
//! [`ProxyError::Uninitialized`] naming that member, except for the initializer itself
//! and a handful of interop probes (promise-style `then`/`catch`/`finally`, type checks,
//! symbol-style names) which must stay inert so that inspecting the proxy does not
//! look like a premature access. After `init`, every member forwards to the same
//! module handle; the proxy never reverts.

use crate::{
    error::{LoadError, ProxyError},
    loader::{ModuleLoader, ModuleSource, PhysicsRuntime},
    physics::{PhysicsWorld, RapierModule, RapierSource},
};
use log::{debug, info};
use rapier3d::prelude::{IntegrationParameters, Vector};
use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

/// Reserved member that triggers initialization.
pub const INIT_MEMBER: &str = "init";

const INTEROP_PROBES: [&str; 4] = ["then", "catch", "finally", "constructor"];

/// Tagged lifecycle of the proxy.
#[derive(Debug)]
pub enum ProxyState<M> {
    Uninitialized,
    Ready(Arc<M>),
}

impl<M> Clone for ProxyState<M> {
    fn clone(&self) -> Self {
        match self {
            ProxyState::Uninitialized => ProxyState::Uninitialized,
            ProxyState::Ready(module) => ProxyState::Ready(Arc::clone(module)),
        }
    }
}

impl<M> ProxyState<M> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProxyState::Ready(_))
    }
}

/// Result of looking a member up on the proxy.
#[derive(Debug)]
pub enum Member<M> {
    /// The reserved initializer, available in every state.
    Initializer,
    /// An interop probe on an uninitialized proxy; answers "nothing here".
    Inert,
    /// Any member of the ready module.
    Module(Arc<M>),
}

/// Names that inspection code probes without meaning to use the module.
pub fn is_interop_probe(member: &str) -> bool {
    INTEROP_PROBES.contains(&member) || member.starts_with("@@") || member.starts_with("Symbol(")
}

pub struct PhysicsProxy<R: ModuleSource, P: ModuleSource> {
    loader: Arc<ModuleLoader<R, P>>,
    state: RwLock<ProxyState<P::Module>>,
}

impl<R, P> PhysicsProxy<R, P>
where
    R: ModuleSource,
    P: ModuleSource,
    P::Module: PhysicsRuntime,
{
    /// Wrap `loader` without starting any load.
    pub fn new(loader: Arc<ModuleLoader<R, P>>) -> Self {
        Self {
            loader,
            state: RwLock::new(ProxyState::Uninitialized),
        }
    }

    pub fn loader(&self) -> &Arc<ModuleLoader<R, P>> {
        &self.loader
    }

    /// Load and start the physics module, then unlock the proxy.
    ///
    /// Concurrent and repeated calls share the loader's single initialization. A failure
    /// leaves the proxy uninitialized.
    pub async fn init(&self) -> Result<Arc<P::Module>, LoadError> {
        if let ProxyState::Ready(module) = &*self.read_state() {
            return Ok(Arc::clone(module));
        }

        let module = self.loader.ensure_physics_initialized().await?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.is_ready() {
            info!("physics proxy ready");
            *state = ProxyState::Ready(Arc::clone(&module));
        }
        Ok(module)
    }

    /// The module, or an error naming `member` if initialization has not completed.
    pub fn access(&self, member: &str) -> Result<Arc<P::Module>, ProxyError> {
        self.try_module().ok_or_else(|| {
            debug!("physics member `{member}` read before init");
            ProxyError::Uninitialized {
                member: member.to_owned(),
            }
        })
    }

    /// Dynamic member lookup.
    pub fn resolve(&self, member: &str) -> Result<Member<P::Module>, ProxyError> {
        if member == INIT_MEMBER {
            return Ok(Member::Initializer);
        }
        match self.try_module() {
            Some(module) => Ok(Member::Module(module)),
            None if is_interop_probe(member) => Ok(Member::Inert),
            None => Err(ProxyError::Uninitialized {
                member: member.to_owned(),
            }),
        }
    }

    /// Run `f` against the module as member `member`.
    pub fn with<T>(&self, member: &str, f: impl FnOnce(&P::Module) -> T) -> Result<T, ProxyError> {
        let module = self.access(member)?;
        Ok(f(&module))
    }

    pub fn is_initialized(&self) -> bool {
        self.try_module().is_some()
    }

    /// The module if initialization has completed, without raising.
    ///
    /// Picks up an initialization driven directly through the loader.
    pub fn try_module(&self) -> Option<Arc<P::Module>> {
        if let ProxyState::Ready(module) = &*self.read_state() {
            return Some(Arc::clone(module));
        }

        let module = self.loader.physics_if_ready()?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.is_ready() {
            *state = ProxyState::Ready(Arc::clone(&module));
        }
        Some(module)
    }

    pub fn state(&self) -> ProxyState<P::Module> {
        self.try_module();
        self.read_state().clone()
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, ProxyState<P::Module>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: ModuleSource> PhysicsProxy<R, RapierSource> {
    /// `World` constructor of the physics module.
    pub fn world(&self, gravity: Vector<f32>) -> Result<PhysicsWorld, ProxyError> {
        self.with("World", |module: &RapierModule| module.world(gravity))
    }

    pub fn integration_parameters(&self) -> Result<IntegrationParameters, ProxyError> {
        self.with("IntegrationParameters", RapierModule::integration_parameters)
    }
}

impl<R: ModuleSource, P: ModuleSource> fmt::Debug for PhysicsProxy<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ready = self
            .state
            .read()
            .map(|s| s.is_ready())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_ready());
        f.debug_struct("PhysicsProxy")
            .field("ready", &ready)
            .field("loader", &self.loader)
            .finish()
    }
}
