#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod policy;
mod prefix;
pub mod workload;

pub use self::{
    policy::{ContainerCheck, Reason, ResourcePolicy, Verdict, Violation},
    prefix::{DisallowedPrefixes, PrefixError},
    workload::{ContainerKind, ContainerSpec, WorkloadSpec},
};
