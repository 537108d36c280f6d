use crate::core::Verdict;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

#[derive(Clone, Debug, Default)]
pub struct AdmissionMetrics {
    reviews: Family<DecisionLabels, Counter>,
    errors: Family<ErrorLabels, Counter>,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct DecisionLabels {
    decision: &'static str,
}

#[derive(Clone, Hash, PartialEq, Eq, EncodeLabelSet, Debug)]
struct ErrorLabels {
    error: &'static str,
}

// === impl AdmissionMetrics ===

impl AdmissionMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let metrics = Self::default();

        reg.register(
            "reviews",
            "Total number of admission reviews that produced a verdict",
            metrics.reviews.clone(),
        );

        reg.register(
            "errors",
            "Total number of admission reviews rejected without a verdict",
            metrics.errors.clone(),
        );

        metrics
    }

    pub(crate) fn verdict(&self, verdict: &Verdict) {
        let decision = if verdict.is_allowed() {
            "allowed"
        } else {
            "denied"
        };
        self.reviews.get_or_create(&DecisionLabels { decision }).inc();
    }

    pub(crate) fn error(&self, error: &'static str) {
        self.errors.get_or_create(&ErrorLabels { error }).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Violation;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn counts_verdicts_and_errors() {
        let mut reg = Registry::with_prefix("gpu_admission");
        let metrics = AdmissionMetrics::register(&mut reg);

        metrics.verdict(&Verdict::Allowed);
        metrics.verdict(&Verdict::Allowed);
        metrics.verdict(&Verdict::Denied(Violation::forbidden("nope")));
        metrics.error("empty_request");

        let mut out = String::new();
        encode(&mut out, &reg).unwrap();
        assert!(out.contains(r#"gpu_admission_reviews_total{decision="allowed"} 2"#));
        assert!(out.contains(r#"gpu_admission_reviews_total{decision="denied"} 1"#));
        assert!(out.contains(r#"gpu_admission_errors_total{error="empty_request"} 1"#));
    }
}
