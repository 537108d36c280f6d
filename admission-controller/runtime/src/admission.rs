use crate::{
    core::{ResourcePolicy, Verdict},
    metrics::AdmissionMetrics,
    review::{self, EnvelopeError},
    workload::{self, WorkloadError},
};
use bytes::Bytes;
use futures::future;
use http_body_util::BodyExt;
use hyper::{http, Request, Response};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

/// The only route served by the admission webhook.
pub const VALIDATE_PATH: &str = "/validate";

/// Validates pod admission reviews against a [`ResourcePolicy`].
#[derive(Clone, Debug)]
pub struct Admission {
    policy: Arc<ResourcePolicy>,
    metrics: AdmissionMetrics,
}

/// Failures that end a review without producing a verdict.
#[derive(Debug, Error)]
pub enum Error {
    #[error("empty body")]
    EmptyRequest,

    #[error("failed to decode body: {0}")]
    MalformedEnvelope(#[from] EnvelopeError),

    #[error("failed to unmarshal pod: {0}")]
    MalformedWorkload(#[from] WorkloadError),

    #[error("failed to marshal response: {0}")]
    ResponseEncode(#[source] serde_json::Error),
}

type Body = http_body_util::Full<Bytes>;

// === impl Admission ===

impl<B> tower::Service<Request<B>> for Admission
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display,
{
    type Response = Response<Body>;
    type Error = std::convert::Infallible;
    type Future = future::BoxFuture<'static, Result<Response<Body>, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        trace!(method = %req.method(), uri = %req.uri());
        if req.method() != http::Method::POST || req.uri().path() != VALIDATE_PATH {
            return Box::pin(future::ok(
                Response::builder()
                    .status(http::StatusCode::NOT_FOUND)
                    .body(Body::default())
                    .expect("not found response must be valid"),
            ));
        }

        let admission = self.clone();
        Box::pin(async move {
            let bytes = match req.into_body().collect().await {
                Ok(body) => body.to_bytes(),
                Err(error) => {
                    warn!(%error, "Failed to read request body");
                    Bytes::new()
                }
            };

            match admission.review(&bytes) {
                Ok(rsp) => Ok(json_response(rsp)),
                Err(error) => {
                    match &error {
                        Error::ResponseEncode(_) => error!(%error, "Failed to encode response"),
                        _ => warn!(%error, "Rejected admission request"),
                    }
                    admission.metrics.error(error.metric_label());
                    Ok(error_response(&error))
                }
            }
        })
    }
}

impl Admission {
    pub fn new(policy: Arc<ResourcePolicy>, metrics: AdmissionMetrics) -> Self {
        Self { policy, metrics }
    }

    /// Runs a single review, returning the encoded response envelope.
    fn review(&self, body: &[u8]) -> Result<Vec<u8>, Error> {
        if body.is_empty() {
            return Err(Error::EmptyRequest);
        }

        let review::DecodedRequest { request: req, object } = review::decode(body)?;
        let workload = workload::extract(object)?;
        let ns = req.namespace.as_deref().unwrap_or_default();
        debug!(uid = %req.uid, %ns, name = %req.name, containers = workload.containers().count());

        let verdict = self.policy.evaluate(&workload, ns);
        match &verdict {
            Verdict::Allowed => debug!(uid = %req.uid, %ns, "Allowed"),
            Verdict::Denied(violation) => {
                info!(uid = %req.uid, %ns, name = %req.name, %violation, "Denied")
            }
        }
        self.metrics.verdict(&verdict);

        let rsp = review::assemble(&req, verdict);
        review::encode(&rsp).map_err(Error::ResponseEncode)
    }
}

// === impl Error ===

impl Error {
    pub fn status(&self) -> http::StatusCode {
        match self {
            Self::ResponseEncode(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
            _ => http::StatusCode::BAD_REQUEST,
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            Self::EmptyRequest => "empty_request",
            Self::MalformedEnvelope(_) => "malformed_envelope",
            Self::MalformedWorkload(_) => "malformed_workload",
            Self::ResponseEncode(_) => "response_encode",
        }
    }
}

fn json_response(bytes: Vec<u8>) -> Response<Body> {
    Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("admission review response must be valid")
}

fn error_response(error: &Error) -> Response<Body> {
    Response::builder()
        .status(error.status())
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header("x-content-type-options", "nosniff")
        .body(Body::from(error.to_string()))
        .expect("error response must be valid")
}
