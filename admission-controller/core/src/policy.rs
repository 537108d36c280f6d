use crate::{
    prefix::DisallowedPrefixes,
    workload::{ContainerSpec, WorkloadSpec},
};

/// A resource policy applied to each container of a workload.
///
/// Checks must be pure: they are shared by all concurrently evaluated
/// requests and may be invoked any number of times for the same input.
pub trait ContainerCheck: std::fmt::Debug + Send + Sync {
    fn check(&self, container: &ContainerSpec, namespace: &str) -> Result<(), Violation>;
}

/// An ordered set of container checks.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Default)]
pub struct ResourcePolicy {
    checks: Vec<Box<dyn ContainerCheck>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(Violation),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub reason: Reason,
    pub message: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reason {
    Forbidden,
}

// === impl ResourcePolicy ===

impl ResourcePolicy {
    pub fn new(checks: Vec<Box<dyn ContainerCheck>>) -> Self {
        Self { checks }
    }

    pub fn push(mut self, check: impl ContainerCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Evaluates every container of `workload` against each check in order.
    ///
    /// Containers are visited in workload order and, for each container, the
    /// checks in policy order. The first violation encountered is returned.
    pub fn evaluate(&self, workload: &WorkloadSpec, namespace: &str) -> Verdict {
        let res = workload.containers().try_for_each(|container| {
            self.checks
                .iter()
                .try_for_each(|check| check.check(container, namespace))
        });
        match res {
            Ok(()) => Verdict::Allowed,
            Err(violation) => Verdict::Denied(violation),
        }
    }
}

impl From<DisallowedPrefixes> for ResourcePolicy {
    fn from(prefixes: DisallowedPrefixes) -> Self {
        Self::default().push(prefixes)
    }
}

// === impl Verdict ===

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Allowed => None,
            Self::Denied(v) => Some(v),
        }
    }
}

// === impl Violation ===

impl Violation {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            reason: Reason::Forbidden,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

// === impl Reason ===

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forbidden => "Forbidden",
        }
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}
