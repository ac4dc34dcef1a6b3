//! Crate-level unit and behaviour tests for the service host.

pub(crate) mod support;
