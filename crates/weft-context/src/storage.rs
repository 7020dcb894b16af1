//! Task-scoped context storage.
//!
//! A [`ContextStorage`] binds one context value to one logical execution: the
//! future tree passed to [`ContextStorage::run_with_context`], across every
//! suspension point inside it. Code running under that scope reads and
//! updates the bound value through the storage instance without it being
//! threaded through call signatures. Bindings live in tokio task-local
//! storage, so two concurrently running executions never observe each other's
//! value even when they interleave on the same worker thread.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::trace;

use crate::error::ContextMissing;
use crate::patch::ContextPatch;

/// Diagnostic name used by [`ContextStorage::new`]; only ever appears in
/// error messages.
pub const DEFAULT_STORAGE_NAME: &str = "ContextStorage";

type Binding = Arc<dyn Any + Send + Sync>;
type BindingSet = Arc<HashMap<u64, Binding>>;

tokio::task_local! {
    /// Bindings of every live storage instance, keyed by slot id, for the
    /// current logical execution. Entering a scope installs a new map; the
    /// enclosing map is restored when the scope's future completes.
    static BINDINGS: BindingSet;
}

/// Slot ids are process-unique so any number of storages, over any context
/// types, coexist in one task's binding set.
static NEXT_SLOT: AtomicU64 = AtomicU64::new(0);

fn current_bindings() -> BindingSet {
    BINDINGS.try_with(Arc::clone).unwrap_or_default()
}

/// Re-establishes the caller's bindings around `fut`.
///
/// `tokio::spawn` starts a fresh logical execution; task-locals do not cross
/// it. Wrapping the spawned future in `propagate` makes it part of the
/// caller's execution instead: it shares the same bound values, so updates
/// made on either side stay visible to both.
///
/// Bindings are captured when `propagate` is called, not when the returned
/// future is first polled.
pub fn propagate<F: Future>(fut: F) -> impl Future<Output = F::Output> {
    BINDINGS.scope(current_bindings(), fut)
}

/// Binds a context value to the execution of a unit of work.
///
/// Construct once with a factory producing a fresh context per scope and
/// share the instance (typically as a `static`); only the bound values are
/// per-execution state.
pub struct ContextStorage<T> {
    factory: Box<dyn Fn() -> T + Send + Sync>,
    name: String,
    slot: u64,
}

impl<T: Send + 'static> ContextStorage<T> {
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::named(factory, DEFAULT_STORAGE_NAME)
    }

    pub fn named(factory: impl Fn() -> T + Send + Sync + 'static, name: impl Into<String>) -> Self {
        Self {
            factory: Box::new(factory),
            name: name.into(),
            slot: NEXT_SLOT.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Diagnostic name, as it appears in [`ContextMissing`] messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `work` with a fresh factory-produced context bound to it.
    ///
    /// Re-entering from inside an active scope installs a child binding that
    /// shadows the outer one for the duration of `work`; the outer binding
    /// (including updates made before re-entry) is visible again afterwards.
    pub async fn run_with_context<F: Future>(&self, work: F) -> F::Output {
        self.run_with_seeded_context((self.factory)(), work).await
    }

    /// Runs `work` with a caller-supplied context instead of a factory-produced
    /// one. Used to pre-populate fields before entering the scope.
    pub async fn run_with_seeded_context<F: Future>(&self, seed: T, work: F) -> F::Output {
        BINDINGS.scope(self.bind(seed), work).await
    }

    /// Synchronous form of [`ContextStorage::run_with_context`] for work that
    /// never suspends.
    pub fn run_with_context_sync<R>(&self, work: impl FnOnce() -> R) -> R {
        self.run_with_seeded_context_sync((self.factory)(), work)
    }

    pub fn run_with_seeded_context_sync<R>(&self, seed: T, work: impl FnOnce() -> R) -> R {
        BINDINGS.sync_scope(self.bind(seed), work)
    }

    /// Snapshot of the currently bound context, or `None` outside any scope.
    pub fn get_context(&self) -> Option<T>
    where
        T: Clone,
    {
        self.with_context(|context| context.clone())
    }

    /// Like [`ContextStorage::get_context`], but failing with
    /// [`ContextMissing`] when no context is bound, the usual sign that the
    /// propagation middleware was not applied at the entry point.
    pub fn require_context(&self) -> Result<T, ContextMissing>
    where
        T: Clone,
    {
        self.get_context()
            .ok_or_else(|| ContextMissing::not_found(&self.name))
    }

    /// Merges `patch` into the currently bound context in place. Fields the
    /// patch does not mention are left untouched.
    pub fn update_context<P: ContextPatch<T>>(&self, patch: P) -> Result<(), ContextMissing> {
        self.with_context(|context| patch.apply_to(context))
            .ok_or_else(|| ContextMissing::update_without_scope(&self.name))
    }

    /// Runs `f` with mutable access to the bound context, or returns `None`
    /// outside any scope. The binding lock is held while `f` runs; `f` must
    /// not call back into the same storage.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let binding = self.current_binding()?;
        // A binding poisoned by a panicking continuation still yields its
        // value: context reads on a request's error path must not panic.
        let mut guard = binding.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut guard))
    }

    fn current_binding(&self) -> Option<Arc<Mutex<T>>> {
        BINDINGS
            .try_with(|set| set.get(&self.slot).cloned())
            .ok()
            .flatten()
            .and_then(|binding| binding.downcast::<Mutex<T>>().ok())
    }

    // Child scopes copy the enclosing binding set with this storage's slot
    // replaced, so sibling scopes stay independent and the enclosing map is
    // untouched.
    fn bind(&self, seed: T) -> BindingSet {
        trace!(storage = %self.name, slot = self.slot, "binding context scope");
        let mut set = (*current_bindings()).clone();
        set.insert(self.slot, Arc::new(Mutex::new(seed)) as Binding);
        Arc::new(set)
    }
}

impl<T> fmt::Debug for ContextStorage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStorage")
            .field("name", &self.name)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
