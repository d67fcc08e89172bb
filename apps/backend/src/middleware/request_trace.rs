//! Assigns every request a trace id.
//!
//! An inbound `x-request-id` that parses as a UUID is adopted so callers can
//! correlate across hops; anything else is replaced with a fresh v4 id. The
//! id is stored in request extensions (read by `TraceSpan` and
//! `StructuredLogger`), scoped as the task-local `trace_ctx` for the whole
//! downstream future (read by error rendering), and echoed back in the
//! `x-request-id` response header. Wire it outermost.

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::HttpMessage;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use uuid::Uuid;

use crate::web::trace_ctx;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Adopt a well-formed inbound id, otherwise mint one.
fn resolve_trace_id(req: &ServiceRequest) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
        .hyphenated()
        .to_string()
}

pub struct RequestTrace;

impl<S, B> Transform<S, ServiceRequest> for RequestTrace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequestTraceService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, inner: S) -> Self::Future {
        ready(Ok(RequestTraceService { inner }))
    }
}

pub struct RequestTraceService<S> {
    inner: S,
}

impl<S, B> Service<ServiceRequest> for RequestTraceService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(inner);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = resolve_trace_id(&req);
        req.extensions_mut().insert(trace_id.clone());

        // A uuid is always a valid header value; the fallback is unreachable.
        let header_value = HeaderValue::from_str(&trace_id)
            .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
        let downstream = trace_ctx::with_trace_id(trace_id, self.inner.call(req));

        Box::pin(async move {
            let mut res = downstream.await?;
            res.headers_mut()
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
            Ok(res)
        })
    }
}
