use crate::{
    policy::{ContainerCheck, Violation},
    workload::ContainerSpec,
};
use thiserror::Error;

/// Resource-name prefixes that may not be requested by any container.
///
/// Matching is a case-sensitive literal prefix test, so a resource name equal
/// to a prefix matches it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisallowedPrefixes(Vec<String>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixError {
    #[error("resource prefix list must not contain empty entries")]
    Empty,
}

// === impl DisallowedPrefixes ===

impl DisallowedPrefixes {
    pub fn new<S: Into<String>>(
        prefixes: impl IntoIterator<Item = S>,
    ) -> Result<Self, PrefixError> {
        let prefixes = prefixes.into_iter().map(Into::into).collect::<Vec<_>>();
        if prefixes.iter().any(String::is_empty) {
            return Err(PrefixError::Empty);
        }
        Ok(Self(prefixes))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    /// Returns the first configured prefix that `resource` starts with.
    pub fn matching(&self, resource: &str) -> Option<&str> {
        self.iter().find(|prefix| resource.starts_with(prefix))
    }
}

impl std::str::FromStr for DisallowedPrefixes {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.split(',').map(str::trim))
    }
}

impl std::fmt::Display for DisallowedPrefixes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.join(",").fmt(f)
    }
}

impl ContainerCheck for DisallowedPrefixes {
    fn check(&self, container: &ContainerSpec, namespace: &str) -> Result<(), Violation> {
        match container
            .resource_names()
            .find(|resource| self.matching(resource).is_some())
        {
            Some(resource) => Err(Violation::forbidden(format!(
                "GPU resource {resource} is not allowed in namespace {namespace}"
            ))),
            None => Ok(()),
        }
    }
}
