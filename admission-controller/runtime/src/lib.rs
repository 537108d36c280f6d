#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use gpu_admission_core as core;

mod admission;
mod args;
mod metrics;
mod review;
mod workload;

pub use self::{
    admission::{Admission, Error},
    args::Args,
    metrics::AdmissionMetrics,
    review::EnvelopeError,
    workload::WorkloadError,
};
