//! Single-flight, memoized loading of the render and physics modules.
//!
//! Model
//! - Each module kind owns one cache slot holding a `Shared` future. The first call
//!   installs the future; every later call (concurrent or not) clones it, so all callers
//!   settle on the same `Arc` handle or the same `LoadError`.
//! - Physics runtime initialization is its own slot composed from the physics load plus
//!   [`PhysicsRuntime::init`]. Caching the composed future (not just its result) is what
//!   makes `init` run exactly once when several callers race.
//! - Futures are lazy: the import starts when the shared future is first polled.
//!
//! Failure handling is a [`FailurePolicy`]. With `Sticky` a settled error is cached for
//! the lifetime of the loader. With `Retry` a settled error is replaced by a fresh
//! attempt on the next call until the attempt budget is spent. A future that is still
//! in flight is never replaced.
//!
//! The slot mutex only guards check-and-install; it is never held across an await.

use crate::{constants::DEFAULT_FAILURE_POLICY, error::LoadError};
use futures::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

/// Shared handle to an in-flight or settled module load.
pub type ModuleFuture<T> = Shared<BoxFuture<'static, Result<Arc<T>, LoadError>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Render,
    Physics,
    /// The one-time runtime start of the physics module.
    PhysicsRuntime,
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModuleKind::Render => "render",
            ModuleKind::Physics => "physics",
            ModuleKind::PhysicsRuntime => "physics runtime",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// What a settled load failure means for later callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The first failure is returned to every caller for the loader's lifetime.
    Sticky,
    /// Start a new attempt after a settled failure, up to `max_attempts` in total.
    Retry { max_attempts: u32 },
}

impl FailurePolicy {
    fn allows_attempt(self, attempts_so_far: u32) -> bool {
        match self {
            FailurePolicy::Sticky => attempts_so_far == 0,
            FailurePolicy::Retry { max_attempts } => attempts_so_far < max_attempts.max(1),
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        DEFAULT_FAILURE_POLICY
    }
}

/// Asynchronous import of a module.
pub trait ModuleSource: Send + Sync + 'static {
    type Module: Send + Sync + 'static;

    fn load(&self) -> BoxFuture<'static, Result<Self::Module, LoadError>>;
}

/// One-time runtime start exposed by a physics module.
pub trait PhysicsRuntime: Send + Sync + 'static {
    fn init(&self) -> BoxFuture<'_, Result<(), LoadError>>;
}

struct Slot<T> {
    pending: Option<ModuleFuture<T>>,
    attempts: u32,
}

/// Cache slot for one module kind.
struct ModuleCell<T> {
    kind: ModuleKind,
    slot: Mutex<Slot<T>>,
}

impl<T: Send + Sync + 'static> ModuleCell<T> {
    fn new(kind: ModuleKind) -> Self {
        Self {
            kind,
            slot: Mutex::new(Slot {
                pending: None,
                attempts: 0,
            }),
        }
    }

    /// Return the cached future, or install the one produced by `start`.
    fn get_or_start<F>(&self, policy: FailurePolicy, start: F) -> ModuleFuture<T>
    where
        F: FnOnce() -> BoxFuture<'static, Result<Arc<T>, LoadError>>,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(pending) = &slot.pending {
            let failed = matches!(pending.peek(), Some(Err(_)));
            if !failed || !policy.allows_attempt(slot.attempts) {
                return pending.clone();
            }
            warn!(
                "retrying {} module load (attempt {})",
                self.kind,
                slot.attempts + 1
            );
        }

        slot.attempts += 1;
        let kind = self.kind;
        let attempt = slot.attempts;
        debug!("starting {kind} module load (attempt {attempt})");

        let future = start()
            .inspect(move |result| match result {
                Ok(_) => info!("{kind} module ready (attempt {attempt})"),
                Err(err) => warn!("{kind} module failed (attempt {attempt}): {err}"),
            })
            .boxed()
            .shared();
        slot.pending = Some(future.clone());
        future
    }

    fn state(&self) -> ModuleState {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.pending.as_ref().map(Shared::peek) {
            None => ModuleState::Unloaded,
            Some(None) => ModuleState::Loading,
            Some(Some(Ok(_))) => ModuleState::Loaded,
            Some(Some(Err(_))) => ModuleState::Failed,
        }
    }

    fn ready(&self) -> Option<Arc<T>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.pending.as_ref().and_then(Shared::peek) {
            Some(Ok(module)) => Some(Arc::clone(module)),
            _ => None,
        }
    }

    fn attempts(&self) -> u32 {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .attempts
    }
}

/// Memoized loaders for the render module `R` and the physics module `P`.
pub struct ModuleLoader<R: ModuleSource, P: ModuleSource> {
    render_source: R,
    physics_source: P,
    policy: FailurePolicy,
    render: ModuleCell<R::Module>,
    physics: ModuleCell<P::Module>,
    runtime: ModuleCell<P::Module>,
}

impl<R: ModuleSource, P: ModuleSource> ModuleLoader<R, P> {
    pub fn new(render_source: R, physics_source: P) -> Self {
        Self {
            render_source,
            physics_source,
            policy: FailurePolicy::default(),
            render: ModuleCell::new(ModuleKind::Render),
            physics: ModuleCell::new(ModuleKind::Physics),
            runtime: ModuleCell::new(ModuleKind::PhysicsRuntime),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn load_render_module(&self) -> ModuleFuture<R::Module> {
        self.render.get_or_start(self.policy, || {
            self.render_source.load().map(|r| r.map(Arc::new)).boxed()
        })
    }

    pub fn load_physics_module(&self) -> ModuleFuture<P::Module> {
        self.physics.get_or_start(self.policy, || {
            self.physics_source.load().map(|r| r.map(Arc::new)).boxed()
        })
    }

    /// Load the physics module and run its runtime initialization exactly once.
    ///
    /// Every caller, including those arriving while initialization is in flight, awaits
    /// the same future and observes the same handle or the same failure.
    pub fn ensure_physics_initialized(&self) -> ModuleFuture<P::Module>
    where
        P::Module: PhysicsRuntime,
    {
        self.runtime.get_or_start(self.policy, || {
            let load = self.load_physics_module();
            async move {
                let module = load.await?;
                module.init().await?;
                Ok::<_, LoadError>(module)
            }
            .boxed()
        })
    }

    pub fn state(&self, kind: ModuleKind) -> ModuleState {
        match kind {
            ModuleKind::Render => self.render.state(),
            ModuleKind::Physics => self.physics.state(),
            ModuleKind::PhysicsRuntime => self.runtime.state(),
        }
    }

    /// Number of load attempts started for `kind`.
    pub fn attempts(&self, kind: ModuleKind) -> u32 {
        match kind {
            ModuleKind::Render => self.render.attempts(),
            ModuleKind::Physics => self.physics.attempts(),
            ModuleKind::PhysicsRuntime => self.runtime.attempts(),
        }
    }

    pub fn render_if_ready(&self) -> Option<Arc<R::Module>> {
        self.render.ready()
    }

    /// The initialized physics module, without suspending.
    pub fn physics_if_ready(&self) -> Option<Arc<P::Module>> {
        self.runtime.ready()
    }
}

impl<R: ModuleSource, P: ModuleSource> fmt::Debug for ModuleLoader<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("policy", &self.policy)
            .field("render", &self.render.state())
            .field("physics", &self.physics.state())
            .field("runtime", &self.runtime.state())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::channel::oneshot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Gate = Shared<oneshot::Receiver<()>>;

    /// Module handed out by [`FakeSource`]; counts runtime initializations.
    #[derive(Debug, Default)]
    pub(crate) struct FakeModule {
        pub inits: AtomicUsize,
        pub fail_init: bool,
    }

    impl PhysicsRuntime for FakeModule {
        fn init(&self) -> BoxFuture<'_, Result<(), LoadError>> {
            async move {
                self.inits.fetch_add(1, Ordering::SeqCst);
                if self.fail_init {
                    Err(LoadError::init("runtime refused to start"))
                } else {
                    Ok(())
                }
            }
            .boxed()
        }
    }

    /// Source that counts loads, optionally fails the first `fail_first` of them and
    /// optionally waits on a gate before resolving.
    #[derive(Clone, Default)]
    pub(crate) struct FakeSource {
        pub loads: Arc<AtomicUsize>,
        pub fail_first: usize,
        pub fail_init: bool,
        pub gate: Option<Gate>,
    }

    impl FakeSource {
        pub fn gated() -> (Self, oneshot::Sender<()>) {
            let (tx, rx) = oneshot::channel();
            let source = Self {
                gate: Some(rx.shared()),
                ..Self::default()
            };
            (source, tx)
        }

        pub fn failing(times: usize) -> Self {
            Self {
                fail_first: times,
                ..Self::default()
            }
        }

        pub fn loads(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl ModuleSource for FakeSource {
        type Module = FakeModule;

        fn load(&self) -> BoxFuture<'static, Result<FakeModule, LoadError>> {
            let loads = Arc::clone(&self.loads);
            let gate = self.gate.clone();
            let fail_first = self.fail_first;
            let fail_init = self.fail_init;
            async move {
                let attempt = loads.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                if attempt < fail_first {
                    return Err(LoadError::import(ModuleKind::Physics, "network error"));
                }
                Ok(FakeModule {
                    inits: AtomicUsize::new(0),
                    fail_init,
                })
            }
            .boxed()
        }
    }

    fn loader(physics: FakeSource) -> ModuleLoader<FakeSource, FakeSource> {
        ModuleLoader::new(FakeSource::default(), physics)
    }

    #[test]
    fn concurrent_initialization_runs_once() {
        let (source, open) = FakeSource::gated();
        let loader = loader(source.clone());

        let a = loader.ensure_physics_initialized();
        let b = loader.ensure_physics_initialized();
        let c = loader.ensure_physics_initialized();

        let (a, b, c, _) = pollster::block_on(async {
            futures::join!(a, b, c, async {
                let _ = open.send(());
            })
        });

        let a = a.expect("first caller");
        let b = b.expect("second caller");
        let c = c.expect("third caller");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(source.loads(), 1);
        assert_eq!(a.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn late_callers_reuse_settled_initialization() {
        let source = FakeSource::default();
        let loader = loader(source.clone());

        let first = pollster::block_on(loader.ensure_physics_initialized()).unwrap();
        let second = pollster::block_on(loader.ensure_physics_initialized()).unwrap();
        let loaded = pollster::block_on(loader.load_physics_module()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &loaded));
        assert_eq!(source.loads(), 1);
        assert_eq!(first.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn render_module_is_memoized_separately() {
        let render = FakeSource::default();
        let physics = FakeSource::default();
        let loader = ModuleLoader::new(render.clone(), physics.clone());

        let a = pollster::block_on(loader.load_render_module()).unwrap();
        let b = pollster::block_on(loader.load_render_module()).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(render.loads(), 1);
        assert_eq!(physics.loads(), 0);
        assert_eq!(loader.state(ModuleKind::Physics), ModuleState::Unloaded);
        assert!(loader.render_if_ready().is_some());
    }

    #[test]
    fn state_moves_from_unloaded_to_loaded() {
        let (source, open) = FakeSource::gated();
        let loader = loader(source);
        assert_eq!(loader.state(ModuleKind::PhysicsRuntime), ModuleState::Unloaded);

        let pending = loader.ensure_physics_initialized();
        assert_eq!(loader.state(ModuleKind::PhysicsRuntime), ModuleState::Loading);
        assert_eq!(loader.state(ModuleKind::Physics), ModuleState::Loading);
        assert!(loader.physics_if_ready().is_none());

        open.send(()).unwrap();
        pollster::block_on(pending).unwrap();

        assert_eq!(loader.state(ModuleKind::Physics), ModuleState::Loaded);
        assert_eq!(loader.state(ModuleKind::PhysicsRuntime), ModuleState::Loaded);
        assert!(loader.physics_if_ready().is_some());
    }

    #[test]
    fn concurrent_callers_share_one_failure() {
        let source = FakeSource::failing(usize::MAX);
        let loader = loader(source.clone());

        let a = loader.ensure_physics_initialized();
        let b = loader.ensure_physics_initialized();
        let (a, b) = pollster::block_on(async { futures::join!(a, b) });

        let a = a.unwrap_err();
        assert_eq!(Err(a.clone()), b.map(|_| ()));
        assert_eq!(source.loads(), 1);

        // Sticky: later callers get the cached error without a new load.
        let again = pollster::block_on(loader.ensure_physics_initialized()).unwrap_err();
        assert_eq!(again, a);
        assert_eq!(source.loads(), 1);
        assert_eq!(loader.state(ModuleKind::Physics), ModuleState::Failed);
    }

    #[test]
    fn retry_policy_recovers_after_transient_failure() {
        let source = FakeSource::failing(1);
        let loader = loader(source.clone()).with_policy(FailurePolicy::Retry { max_attempts: 2 });

        let first = pollster::block_on(loader.ensure_physics_initialized());
        assert!(matches!(first, Err(LoadError::Import { .. })));

        let second = pollster::block_on(loader.ensure_physics_initialized()).unwrap();
        let third = pollster::block_on(loader.ensure_physics_initialized()).unwrap();

        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(source.loads(), 2);
        assert_eq!(loader.attempts(ModuleKind::Physics), 2);
        assert_eq!(second.inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retry_policy_stops_after_budget() {
        let source = FakeSource::failing(usize::MAX);
        let loader = loader(source.clone()).with_policy(FailurePolicy::Retry { max_attempts: 2 });

        for _ in 0..5 {
            assert!(pollster::block_on(loader.load_physics_module()).is_err());
        }
        assert_eq!(source.loads(), 2);
        assert_eq!(loader.attempts(ModuleKind::Physics), 2);
    }

    #[test]
    fn init_failure_is_reported_once_and_cached() {
        let source = FakeSource {
            fail_init: true,
            ..FakeSource::default()
        };
        let loader = loader(source.clone());

        let err = pollster::block_on(loader.ensure_physics_initialized()).unwrap_err();
        assert!(matches!(err, LoadError::Init { .. }));
        let again = pollster::block_on(loader.ensure_physics_initialized()).unwrap_err();
        assert_eq!(err, again);

        assert_eq!(loader.state(ModuleKind::Physics), ModuleState::Loaded);
        assert_eq!(loader.state(ModuleKind::PhysicsRuntime), ModuleState::Failed);
        let module = pollster::block_on(loader.load_physics_module()).unwrap();
        assert_eq!(module.inits.load(Ordering::SeqCst), 1);
        assert_eq!(source.loads(), 1);
    }
}
