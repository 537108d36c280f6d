use std::collections::BTreeMap;

/// The containers of a workload, in evaluation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadSpec {
    containers: Vec<ContainerSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub kind: ContainerKind,

    /// Requested quantities keyed by resource name. Quantities are carried
    /// verbatim and never interpreted.
    pub requests: BTreeMap<String, String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Primary,
    Init,
}

// === impl WorkloadSpec ===

impl WorkloadSpec {
    /// Builds a workload from its primary and init containers.
    ///
    /// Primary containers are always ordered before init containers,
    /// regardless of the order in which they are supplied.
    pub fn new(
        primary: impl IntoIterator<Item = ContainerSpec>,
        init: impl IntoIterator<Item = ContainerSpec>,
    ) -> Self {
        let mut containers = primary
            .into_iter()
            .map(|c| ContainerSpec {
                kind: ContainerKind::Primary,
                ..c
            })
            .collect::<Vec<_>>();
        containers.extend(init.into_iter().map(|c| ContainerSpec {
            kind: ContainerKind::Init,
            ..c
        }));
        Self { containers }
    }

    pub fn containers(&self) -> impl Iterator<Item = &ContainerSpec> + '_ {
        self.containers.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

// === impl ContainerSpec ===

impl ContainerSpec {
    pub fn new(name: impl Into<String>, requests: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            kind: ContainerKind::Primary,
            requests,
        }
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.requests.keys().map(String::as_str)
    }
}
