//! Admission review envelopes: decoding requests, assembling and encoding
//! responses.

use crate::core::Verdict;
use kube::core::{
    admission::{self, ConvertAdmissionReviewError},
    DynamicObject, TypeMeta,
};
use thiserror::Error;

pub(crate) type AdmissionReview = admission::AdmissionReview<DynamicObject>;
pub(crate) type AdmissionRequest = admission::AdmissionRequest<DynamicObject>;
pub(crate) type AdmissionResponse = admission::AdmissionResponse;

pub(crate) const API_VERSION: &str = "admission.k8s.io/v1";
pub(crate) const KIND: &str = "AdmissionReview";

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported admission review type: {api_version}/{kind}")]
    UnsupportedType { api_version: String, kind: String },

    #[error(transparent)]
    MissingRequest(#[from] ConvertAdmissionReviewError),
}

/// A decoded review request and the raw object it carries.
///
/// Embedded objects are held back from the typed request; their shape is
/// checked by the workload extractor, not the envelope decoder.
#[derive(Debug)]
pub(crate) struct DecodedRequest {
    pub(crate) request: AdmissionRequest,
    pub(crate) object: Option<serde_json::Value>,
}

/// Decodes an `admission.k8s.io/v1` review and returns its request.
///
/// Fields outside the known schema are ignored.
pub(crate) fn decode(bytes: &[u8]) -> Result<DecodedRequest, EnvelopeError> {
    let mut review: serde_json::Value = serde_json::from_slice(bytes)?;
    let mut object = None;
    if let Some(req) = review.get_mut("request").and_then(|r| r.as_object_mut()) {
        object = req.remove("object").filter(|o| !o.is_null());
        req.remove("oldObject");
    }

    let review: AdmissionReview = serde_json::from_value(review)?;
    let TypeMeta { api_version, kind } = &review.types;
    if api_version != API_VERSION || kind != KIND {
        return Err(EnvelopeError::UnsupportedType {
            api_version: api_version.clone(),
            kind: kind.clone(),
        });
    }
    Ok(DecodedRequest {
        request: review.try_into()?,
        object,
    })
}

/// Builds the review response for `req` carrying `verdict`.
///
/// The response's uid is always the request's uid.
pub(crate) fn assemble(req: &AdmissionRequest, verdict: Verdict) -> AdmissionReview {
    let mut rsp = AdmissionResponse::from(req);
    rsp.types = TypeMeta {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
    };

    if let Verdict::Denied(violation) = verdict {
        rsp = rsp.deny(&violation.message);
        rsp.result.reason = violation.reason.to_string();
    }

    rsp.into_review()
}

pub(crate) fn encode(review: &AdmissionReview) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(review)
}
