//! Service kernel for the ytmd desktop shell.
//!
//! The shell is assembled from a fixed set of long-lived services. Each
//! service declares the services it depends on; a [`ServiceCollection`]
//! orders the declarations so that dependencies are constructed first, and a
//! [`ServiceHost`] drives every instance through four global stages:
//!
//! 1. **PreInitialized**: each service loads its own state.
//! 2. **Initialized**: each service becomes queryable by dependents.
//! 3. **PostInitialized**: services wire cross-service subscriptions.
//! 4. **Terminated**: services flush and release state.
//!
//! A stage transition is a barrier: no hook of stage N+1 runs anywhere until
//! every service returned from stage N. Services may only resolve the
//! dependencies they declared, which keeps the coupling between subsystems
//! visible in one place.
//!
//! Storage is arena-style. Services are addressed by name and handed out as
//! `Arc`s; the host itself is only reachable through weak [`HostHandle`]s so
//! no service keeps the arena alive.

mod collection;
mod error;
mod guard;
mod host;
pub mod observer;
mod service;
mod stage;

pub use collection::ServiceCollection;
pub use error::{HostError, ServiceError};
pub use guard::InitializationGuard;
pub use host::{HostHandle, ServiceHost};
pub use observer::{Subscribers, Subscription};
pub use service::{
    Service, ServiceContext, ServiceDefinition, ServiceDescriptor, ServiceInstance,
};
pub use stage::LifecycleStage;

#[cfg(test)]
mod tests;
