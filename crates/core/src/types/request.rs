//! Transport-independent view of an incoming request

use std::net::IpAddr;

/// What the gate needs from a request, regardless of the HTTP framework
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    /// Concrete request path, e.g. `/api/news/42`
    pub path: String,
    /// Query parameters in arrival order
    pub query: Vec<(String, String)>,
    /// Raw `Authorization` header value
    pub authorization: Option<String>,
    /// Network origin, used to key anonymous callers
    pub source: IpAddr,
}

impl GateRequest {
    #[must_use]
    pub fn new(path: impl Into<String>, source: IpAddr) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            authorization: None,
            source,
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }

    /// Attach `Authorization: Bearer <token>`
    #[must_use]
    pub fn with_bearer(self, token: &str) -> Self {
        self.with_authorization(format!("Bearer {token}"))
    }
}
