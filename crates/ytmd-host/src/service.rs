//! Service capability, static definitions, and construction descriptors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::host::{HostHandle, ServiceArena, ServiceEntry};
use crate::{HostError, LifecycleStage, ServiceError};

/// Long-lived subsystem driven through the four lifecycle stages.
///
/// Every hook runs exactly once, in dependency order, and the host never
/// calls a hook of stage N+1 before every service returned from stage N.
pub trait Service: Send + Sync + 'static {
    /// Loads state that has no cross-service dependency.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when local resources cannot be prepared.
    fn on_pre_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError>;

    /// Makes the service queryable by its dependents.
    ///
    /// Implementations guard against double invocation, usually with an
    /// [`crate::InitializationGuard`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AlreadyInitialized`] on a second call.
    fn on_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError>;

    /// Wires subscriptions to other services.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when a dependency cannot be resolved.
    fn on_post_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError>;

    /// Flushes and releases state at shutdown.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] when state cannot be flushed.
    fn on_terminated(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError>;
}

/// Static identity and dependency declaration of a concrete service type.
pub trait ServiceDefinition: Service + Sized {
    /// Unique name used as the identity key.
    const NAME: &'static str;

    /// Names of the services this type may resolve through
    /// [`ServiceContext::get_dependency`].
    const DEPENDENCIES: &'static [&'static str] = &[];
}

/// Constructed service stored in the host arena.
pub struct ServiceInstance {
    pub(crate) hooks: Arc<dyn Service>,
    pub(crate) instance: Arc<dyn Any + Send + Sync>,
}

impl ServiceInstance {
    /// Wraps a freshly constructed service.
    #[must_use]
    pub fn new<T: Service>(service: T) -> Self {
        let shared = Arc::new(service);
        let hooks: Arc<dyn Service> = Arc::clone(&shared) as Arc<dyn Service>;
        Self {
            hooks,
            instance: shared,
        }
    }
}

type Constructor = Box<dyn FnOnce(HostHandle) -> ServiceInstance + Send>;

/// Plain descriptor registered with a [`crate::ServiceCollection`].
///
/// A descriptor is an id, the ids it depends on, and a one-shot constructor.
/// The constructor receives a [`HostHandle`] bound to the host being built;
/// the handle cannot resolve services until construction has finished.
pub struct ServiceDescriptor {
    pub(crate) name: &'static str,
    pub(crate) dependencies: Vec<&'static str>,
    pub(crate) constructor: Constructor,
}

impl ServiceDescriptor {
    /// Builds a descriptor from explicit graph data.
    #[must_use]
    pub fn new<F>(name: &'static str, dependencies: Vec<&'static str>, constructor: F) -> Self
    where
        F: FnOnce(HostHandle) -> ServiceInstance + Send + 'static,
    {
        Self {
            name,
            dependencies,
            constructor: Box::new(constructor),
        }
    }

    /// Builds a descriptor for a [`ServiceDefinition`] type.
    #[must_use]
    pub fn of<T, F>(constructor: F) -> Self
    where
        T: ServiceDefinition,
        F: FnOnce(HostHandle) -> T + Send + 'static,
    {
        Self::new(T::NAME, T::DEPENDENCIES.to_vec(), move |host| {
            ServiceInstance::new(constructor(host))
        })
    }

    /// Builds a descriptor for a [`ServiceDefinition`] that has a default
    /// value.
    #[must_use]
    pub fn of_default<T>() -> Self
    where
        T: ServiceDefinition + Default,
    {
        Self::of::<T, _>(|_| T::default())
    }

    /// Unique service name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared dependency names in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[&'static str] {
        &self.dependencies
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// View of the host handed to a service while one of its hooks runs.
pub struct ServiceContext<'a> {
    arena: &'a Arc<ServiceArena>,
    entry: &'a ServiceEntry,
}

impl<'a> ServiceContext<'a> {
    pub(crate) const fn new(arena: &'a Arc<ServiceArena>, entry: &'a ServiceEntry) -> Self {
        Self { arena, entry }
    }

    /// Name of the service whose hook is running.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.entry.name
    }

    /// Stage the host is entering.
    #[must_use]
    pub fn stage(&self) -> LifecycleStage {
        self.arena.stage()
    }

    /// Resolves a declared dependency.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UndeclaredDependency`] when `T` is missing from
    /// the requesting service's declared dependencies, even if the host
    /// holds an instance of `T`.
    pub fn get_dependency<T: ServiceDefinition>(&self) -> Result<Arc<T>, HostError> {
        if !self.entry.dependencies.contains(&T::NAME) {
            return Err(HostError::UndeclaredDependency {
                requester: self.entry.name,
                dependency: T::NAME,
            });
        }
        self.arena.lookup::<T>(T::NAME)
    }

    /// Returns a handle that outlives the hook invocation.
    #[must_use]
    pub fn host(&self) -> HostHandle {
        HostHandle::from_arena(self.arena)
    }
}
