//! Registry of service descriptors and their dependency ordering.
//!
//! The [`ServiceCollection`] stores descriptors keyed by name and produces a
//! construction order in which every dependency precedes its dependents.
//! Duplicate registrations are rejected without touching the entry already
//! stored under that name.

use std::collections::{HashMap, HashSet};

use crate::HostError;
use crate::service::ServiceDescriptor;

/// Set of services a [`crate::ServiceHost`] will construct.
///
/// Services keep their registration order unless a dependency forces an
/// earlier position: registering `[A, B, C, D]` where `C` depends on `D`
/// yields `[A, B, D, C]`.
#[derive(Debug, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl ServiceCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::DuplicateService`] when the name is taken.
    pub fn add_service(&mut self, descriptor: ServiceDescriptor) -> Result<(), HostError> {
        let name = descriptor.name();
        if self.index.contains_key(name) {
            return Err(HostError::DuplicateService { name });
        }
        self.index.insert(name, self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Registers descriptors in order, stopping at the first duplicate.
    ///
    /// Descriptors registered before the duplicate stay registered.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::DuplicateService`] for the first name already
    /// present.
    pub fn add_services<I>(&mut self, descriptors: I) -> Result<(), HostError>
    where
        I: IntoIterator<Item = ServiceDescriptor>,
    {
        for descriptor in descriptors {
            self.add_service(descriptor)?;
        }
        Ok(())
    }

    /// Returns `true` when a descriptor with `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Looks up a registered descriptor.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.index
            .get(name)
            .and_then(|position| self.descriptors.get(*position))
    }

    /// Number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Computes the dependency-respecting construction order.
    ///
    /// Depth-first, post-order over descriptors in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::UnknownDependency`] for a dependency outside the
    /// collection and [`HostError::CircularDependency`] when a dependency is
    /// still being visited.
    pub fn dependency_order(&self) -> Result<Vec<&'static str>, HostError> {
        let mut walk = TopologicalWalk::new(self.descriptors.len());
        for descriptor in &self.descriptors {
            walk.visit(self, descriptor)?;
        }
        Ok(walk.sorted)
    }

    pub(crate) fn into_dependency_ordered(self) -> Result<Vec<ServiceDescriptor>, HostError> {
        let order = self.dependency_order()?;
        let Self { descriptors, index } = self;
        let mut slots: Vec<Option<ServiceDescriptor>> = descriptors.into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .filter_map(|name| {
                index
                    .get(name)
                    .and_then(|position| slots.get_mut(*position))
                    .and_then(Option::take)
            })
            .collect())
    }
}

struct TopologicalWalk {
    sorted: Vec<&'static str>,
    visited: HashSet<&'static str>,
    in_progress: HashSet<&'static str>,
}

impl TopologicalWalk {
    fn new(capacity: usize) -> Self {
        Self {
            sorted: Vec::with_capacity(capacity),
            visited: HashSet::with_capacity(capacity),
            in_progress: HashSet::new(),
        }
    }

    fn visit(
        &mut self,
        collection: &ServiceCollection,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), HostError> {
        let name = descriptor.name();
        if !self.visited.insert(name) {
            return Ok(());
        }

        self.in_progress.insert(name);
        for &dependency in descriptor.dependencies() {
            let Some(target) = collection.get(dependency) else {
                return Err(HostError::UnknownDependency {
                    service: name,
                    dependency,
                });
            };
            if self.in_progress.contains(dependency) {
                return Err(HostError::CircularDependency {
                    service: name,
                    dependency,
                });
            }
            self.visit(collection, target)?;
        }
        self.in_progress.remove(name);
        self.sorted.push(name);
        Ok(())
    }
}
