//! Mapping between axum requests and responses and the gate

use crate::gate::Gate;
use crate::response::GateResponse;
use axum::extract::Query;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatehouse_cache::CachedResponse;
use gatehouse_core::{
    constants::{
        HEADER_CACHE_KEY, HEADER_CACHE_STATUS, HEADER_RATE_LIMIT, HEADER_RATE_REMAINING,
        HEADER_RATE_RESET, HEADER_RETRY_AFTER,
    },
    GateError, GateRequest, Principal, RateStatus, Route,
};
use std::fmt::Display;
use std::future::Future;
use std::net::IpAddr;

const BEARER_CHALLENGE: &str = "Bearer realm=\"gatehouse\"";

/// A denial on its way out as an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRejection(pub GateError);

impl From<GateError> for GateRejection {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        if self.0.is_authentication_failure() {
            headers.insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BEARER_CHALLENGE),
            );
        }
        if let Some(rate) = self.0.rate_status() {
            put_rate_headers(&mut headers, rate);
            put(&mut headers, HEADER_RETRY_AFTER, rate.reset_secs().to_string());
        }

        (status, headers, Json(self.0.to_body())).into_response()
    }
}

impl IntoResponse for GateResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        if let Some(rate) = &self.rate {
            put_rate_headers(&mut headers, rate);
        }
        if let Some(cache) = &self.cache {
            put(&mut headers, HEADER_CACHE_STATUS, cache.status.as_str().to_string());
            put(&mut headers, HEADER_CACHE_KEY, cache.key.to_string());
            if !cache.max_age.is_zero() {
                headers.insert(
                    header::CACHE_CONTROL,
                    HeaderValue::from_str(&format!("max-age={}", cache.max_age.as_secs()))
                        .unwrap_or(HeaderValue::from_static("no-cache")),
                );
            }
        }

        (status, headers, Json(self.body().clone())).into_response()
    }
}

/// `RateLimit-Limit`, `RateLimit-Remaining` and `RateLimit-Reset`
pub fn put_rate_headers(headers: &mut HeaderMap, rate: &RateStatus) {
    put(headers, HEADER_RATE_LIMIT, rate.limit.to_string());
    put(headers, HEADER_RATE_REMAINING, rate.remaining.to_string());
    put(headers, HEADER_RATE_RESET, rate.reset_secs().to_string());
}

fn put(headers: &mut HeaderMap, name: &str, value: String) {
    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(&value),
    ) {
        headers.insert(name, value);
    }
}

/// Build the transport-independent request from axum parts
///
/// A non UTF-8 `Authorization` header is kept lossily so it fails
/// credential parsing instead of looking absent.
#[must_use]
pub fn gate_request(uri: &Uri, headers: &HeaderMap, source: IpAddr) -> GateRequest {
    let mut request = GateRequest::new(uri.path(), source);
    request.query = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_else(|_| parse_query(uri.query().unwrap_or_default()));
    request.authorization = headers
        .get(header::AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
    request
}

/// Raw split for queries that do not decode cleanly
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (name.to_string(), value.to_string())
        })
        .collect()
}

/// Gate an axum request and render whatever comes out
pub async fn respond<F, Fut, E>(
    gate: &Gate,
    route: &Route,
    request: &GateRequest,
    handler: F,
) -> Response
where
    F: FnOnce(Principal) -> Fut,
    Fut: Future<Output = Result<CachedResponse, E>>,
    E: Display,
{
    match gate.handle(route, request, handler).await {
        Ok(response) => response.into_response(),
        Err(err) => GateRejection(err).into_response(),
    }
}
