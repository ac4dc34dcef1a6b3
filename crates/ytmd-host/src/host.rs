//! Service host: owns constructed services and drives the global lifecycle.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, info};

use crate::service::{ServiceContext, ServiceDescriptor, ServiceInstance};
use crate::{
    HostError, LifecycleStage, Service, ServiceCollection, ServiceDefinition, ServiceError,
};

const HOST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::host");

pub(crate) struct ServiceEntry {
    pub(crate) name: &'static str,
    pub(crate) dependencies: Vec<&'static str>,
    hooks: Arc<dyn Service>,
    instance: Arc<dyn Any + Send + Sync>,
}

/// Arena of constructed services, addressed by name.
pub(crate) struct ServiceArena {
    entries: Vec<ServiceEntry>,
    index: HashMap<&'static str, usize>,
    stage: AtomicU8,
}

impl ServiceArena {
    pub(crate) fn stage(&self) -> LifecycleStage {
        LifecycleStage::from_u8(self.stage.load(Ordering::Acquire))
    }

    fn set_stage(&self, stage: LifecycleStage) {
        self.stage.store(stage.as_u8(), Ordering::Release);
    }

    pub(crate) fn lookup<T>(&self, name: &'static str) -> Result<Arc<T>, HostError>
    where
        T: Any + Send + Sync,
    {
        let entry = self
            .index
            .get(name)
            .and_then(|position| self.entries.get(*position))
            .ok_or(HostError::ServiceNotFound { name })?;
        Arc::clone(&entry.instance)
            .downcast::<T>()
            .map_err(|_| HostError::TypeMismatch { name })
    }
}

/// Weak reference to a host, handed to services and integrations.
///
/// Holding a handle never keeps the host alive, so services can keep one
/// without creating reference cycles through the arena.
#[derive(Clone)]
pub struct HostHandle {
    arena: Weak<ServiceArena>,
}

impl HostHandle {
    pub(crate) fn from_arena(arena: &Arc<ServiceArena>) -> Self {
        Self {
            arena: Arc::downgrade(arena),
        }
    }

    /// Builds a handle that is not attached to any host.
    ///
    /// Every lookup through it fails with [`HostError::HostDropped`].
    #[must_use]
    pub const fn detached() -> Self {
        Self { arena: Weak::new() }
    }

    /// Resolves a hosted service without a declared-dependency check.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::HostDropped`] when the host no longer exists,
    /// [`HostError::ServiceNotFound`] when `T` is not hosted.
    pub fn get_service<T: ServiceDefinition>(&self) -> Result<Arc<T>, HostError> {
        let arena = self.arena.upgrade().ok_or(HostError::HostDropped)?;
        arena.lookup::<T>(T::NAME)
    }

    /// Current stage of the host, or `None` when it was dropped.
    #[must_use]
    pub fn stage(&self) -> Option<LifecycleStage> {
        self.arena.upgrade().map(|arena| arena.stage())
    }

    /// Returns `true` while the host is `Initialized` or `PostInitialized`.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.stage().is_some_and(LifecycleStage::is_initialized)
    }
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHandle")
            .field("stage", &self.stage())
            .finish()
    }
}

/// Owner of every constructed service.
///
/// # Example
///
/// ```ignore
/// let mut collection = ServiceCollection::new();
/// collection.add_services([
///     ServiceDescriptor::of_default::<ConfigStore>(),
///     ServiceDescriptor::of_default::<TrayManager>(),
/// ])?;
/// let mut host = ServiceHost::new(collection)?;
/// host.run_next_lifecycle()?; // PreInitialized
/// ```
pub struct ServiceHost {
    arena: Arc<ServiceArena>,
}

impl ServiceHost {
    /// Sorts the collection by dependency and constructs every service once.
    ///
    /// # Errors
    ///
    /// Returns the collection's ordering error: unknown or circular
    /// dependencies.
    pub fn new(collection: ServiceCollection) -> Result<Self, HostError> {
        let ordered = collection.into_dependency_ordered()?;
        let arena = Arc::new_cyclic(|weak: &Weak<ServiceArena>| {
            let mut entries = Vec::with_capacity(ordered.len());
            let mut index = HashMap::with_capacity(ordered.len());
            for descriptor in ordered {
                let ServiceDescriptor {
                    name,
                    dependencies,
                    constructor,
                } = descriptor;
                let ServiceInstance { hooks, instance } = constructor(HostHandle {
                    arena: weak.clone(),
                });
                debug!(
                    target: HOST_TARGET,
                    service = name,
                    position = entries.len(),
                    "constructed service"
                );
                index.insert(name, entries.len());
                entries.push(ServiceEntry {
                    name,
                    dependencies,
                    hooks,
                    instance,
                });
            }
            ServiceArena {
                entries,
                index,
                stage: AtomicU8::new(LifecycleStage::NotInitialized.as_u8()),
            }
        });
        Ok(Self { arena })
    }

    /// Looks up a hosted service by its definition.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::ServiceNotFound`] when `T` was never registered.
    pub fn get_service<T: ServiceDefinition>(&self) -> Result<Arc<T>, HostError> {
        self.arena.lookup::<T>(T::NAME)
    }

    /// Returns a weak handle to this host.
    #[must_use]
    pub fn handle(&self) -> HostHandle {
        HostHandle::from_arena(&self.arena)
    }

    /// Current lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> LifecycleStage {
        self.arena.stage()
    }

    /// Returns `true` while dependents may safely be resolved.
    #[must_use]
    pub fn initialized(&self) -> bool {
        self.stage().is_initialized()
    }

    /// Service names in construction (dependency) order.
    #[must_use]
    pub fn service_names(&self) -> Vec<&'static str> {
        self.arena.entries.iter().map(|entry| entry.name).collect()
    }

    /// Advances to the next stage and runs its hook on every service.
    ///
    /// Hooks run in dependency order and the call returns only after every
    /// service returned, so the transition is a barrier across the host.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::LifecycleExhausted`] after `Terminated`, or
    /// [`HostError::Hook`] for the first hook that fails. The stage still
    /// advances in that case; services after the failing one are skipped.
    pub fn run_next_lifecycle(&mut self) -> Result<LifecycleStage, HostError> {
        let current = self.stage();
        let next = current
            .next()
            .ok_or(HostError::LifecycleExhausted { stage: current })?;
        self.arena.set_stage(next);
        info!(target: HOST_TARGET, stage = %next, "entering lifecycle stage");

        for entry in &self.arena.entries {
            let context = ServiceContext::new(&self.arena, entry);
            run_hook(next, entry.hooks.as_ref(), &context).map_err(|source| HostError::Hook {
                service: entry.name,
                stage: next,
                source,
            })?;
        }
        Ok(next)
    }
}

fn run_hook(
    stage: LifecycleStage,
    service: &dyn Service,
    context: &ServiceContext<'_>,
) -> Result<(), ServiceError> {
    match stage {
        LifecycleStage::NotInitialized => Ok(()),
        LifecycleStage::PreInitialized => service.on_pre_initialized(context),
        LifecycleStage::Initialized => service.on_initialized(context),
        LifecycleStage::PostInitialized => service.on_post_initialized(context),
        LifecycleStage::Terminated => service.on_terminated(context),
    }
}

impl fmt::Debug for ServiceHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHost")
            .field("stage", &self.stage())
            .field("services", &self.service_names())
            .finish()
    }
}
