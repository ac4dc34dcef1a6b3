//! Test services that record every hook invocation.

use std::sync::{Arc, Mutex};

use crate::{
    HostHandle, InitializationGuard, LifecycleStage, Service, ServiceContext, ServiceDefinition,
    ServiceDescriptor, ServiceError,
};

/// Service whose hooks do nothing.
#[derive(Debug, Default)]
pub struct Inert;

impl Service for Inert {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_post_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Shared log of `(service, stage)` hook invocations.
#[derive(Debug, Clone, Default)]
pub struct HookLog {
    calls: Arc<Mutex<Vec<(&'static str, LifecycleStage)>>>,
}

impl HookLog {
    pub fn record(&self, service: &'static str, stage: LifecycleStage) {
        self.calls
            .lock()
            .expect("hook log mutex poisoned")
            .push((service, stage));
    }

    pub fn calls(&self) -> Vec<(&'static str, LifecycleStage)> {
        self.calls.lock().expect("hook log mutex poisoned").clone()
    }

    pub fn calls_for(&self, stage: LifecycleStage) -> Vec<&'static str> {
        self.calls()
            .into_iter()
            .filter(|(_, recorded)| *recorded == stage)
            .map(|(service, _)| service)
            .collect()
    }
}

/// Service that records hook invocations under a fixed name.
pub struct Recording {
    name: &'static str,
    log: HookLog,
    guard: InitializationGuard,
    host: HostHandle,
}

impl Recording {
    pub fn descriptor(
        name: &'static str,
        dependencies: &[&'static str],
        log: &HookLog,
    ) -> ServiceDescriptor {
        let log = log.clone();
        ServiceDescriptor::new(name, dependencies.to_vec(), move |host| {
            crate::ServiceInstance::new(Self {
                name,
                log,
                guard: InitializationGuard::new(),
                host,
            })
        })
    }

    fn record(&self, context: &ServiceContext<'_>) {
        assert_eq!(context.name(), self.name, "context bound to another service");
        self.log.record(self.name, context.stage());
    }
}

impl Service for Recording {
    fn on_pre_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.record(context);
        Ok(())
    }

    fn on_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.guard.mark(self.name)?;
        self.record(context);
        Ok(())
    }

    fn on_post_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        assert!(self.host.is_initialized(), "host handle sees the live stage");
        self.record(context);
        Ok(())
    }

    fn on_terminated(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        self.record(context);
        Ok(())
    }
}

/// Typed service with no dependencies.
#[derive(Debug, Default)]
pub struct Clock {
    pub ticks: Mutex<u32>,
}

impl Service for Clock {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        *self.ticks.lock().expect("clock mutex poisoned") += 1;
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_post_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl ServiceDefinition for Clock {
    const NAME: &'static str = "Clock";
}

/// Typed service that declares [`Clock`] and resolves it after
/// initialisation.
#[derive(Debug, Default)]
pub struct Scheduler {
    pub observed_ticks: Mutex<Option<u32>>,
}

impl Service for Scheduler {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_post_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        let clock = context.get_dependency::<Clock>()?;
        let ticks = *clock.ticks.lock().expect("clock mutex poisoned");
        *self.observed_ticks.lock().expect("scheduler mutex poisoned") = Some(ticks);
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl ServiceDefinition for Scheduler {
    const NAME: &'static str = "Scheduler";
    const DEPENDENCIES: &'static [&'static str] = &[Clock::NAME];
}

/// Typed service that reaches for [`Clock`] without declaring it.
#[derive(Debug, Default)]
pub struct Intruder;

impl Service for Intruder {
    fn on_pre_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_initialized(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }

    fn on_post_initialized(&self, context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        context.get_dependency::<Clock>()?;
        Ok(())
    }

    fn on_terminated(&self, _context: &ServiceContext<'_>) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl ServiceDefinition for Intruder {
    const NAME: &'static str = "Intruder";
}
