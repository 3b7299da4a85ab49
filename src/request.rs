//! The `Request` value object and its fluent builder.

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::body::RequestBody;
use crate::error::Error;
use crate::header::HeaderMap;
use crate::uri::Uri;

/// An HTTP method. Always an uppercase token on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
    Connect,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
        }
    }

    /// Whether retrying this method without knowing if the server already
    /// saw it is considered safe by default.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, Method::Post | Method::Patch)
    }
}

/// A request, immutable once it leaves the client facade until a middleware
/// mutates it in its pre-phase.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: RequestBody,
    /// Credentials supplied via `.auth(user, pass)`. Absent if the caller
    /// instead set `Authorization` directly.
    pub auth: Option<(String, String)>,
    /// True if the caller set `Authorization` explicitly rather than via
    /// `.auth(...)` — disables the Authentication middleware's 401 retry.
    pub explicit_authorization: bool,
    pub timeout: Option<Duration>,
    /// Remaining redirect budget; decremented by `RedirectMiddleware`.
    pub redirect_budget: u32,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        Request {
            method,
            uri,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            auth: None,
            explicit_authorization: false,
            timeout: None,
            redirect_budget: 10,
        }
    }

    /// A shallow copy used when a redirect or auth-retry needs to replay a
    /// request against a (possibly new) URI. `Request` has no blanket
    /// `Clone` because `RequestBody::Stream` cannot be cloned; pass
    /// `preserve_body: false` to drop the body outright (e.g. a 301/302/303
    /// method rewrite), or `true` to carry it over via
    /// `RequestBody::shallow_clone` (a `Stream` body still becomes `Empty`
    /// either way).
    pub fn with_uri(&self, uri: Uri, preserve_body: bool) -> Request {
        Request {
            method: self.method,
            uri,
            headers: self.headers.clone(),
            body: if preserve_body {
                self.body.shallow_clone()
            } else {
                RequestBody::Empty
            },
            auth: self.auth.clone(),
            explicit_authorization: self.explicit_authorization,
            timeout: self.timeout,
            redirect_budget: self.redirect_budget,
        }
    }
}

/// Fluent construction of a [`Request`], mirroring the Client facade's
/// `get/post/.../send` surface.
pub struct RequestBuilder {
    method: Method,
    uri: Result<Uri, Error>,
    headers: HeaderMap,
    body: RequestBody,
    params: Vec<(String, String)>,
    auth: Option<(String, String)>,
    explicit_authorization: bool,
    timeout: Option<Duration>,
}

impl RequestBuilder {
    pub fn new(method: Method, url: &str) -> Self {
        RequestBuilder {
            method,
            uri: Uri::parse(url),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            params: Vec::new(),
            auth: None,
            explicit_authorization: false,
            timeout: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let explicit_auth = name.eq_ignore_ascii_case("authorization");
        if self.headers.add(name, value).is_ok() && explicit_auth {
            self.explicit_authorization = true;
        }
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn content(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| Error::protocol(format!("failed to serialize JSON body: {e}")))?;
        let _ = self.headers.set("Content-Type", "application/json");
        self.body = RequestBody::Bytes(Bytes::from(bytes));
        Ok(self)
    }

    pub fn auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.auth = Some((user.into(), pass.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Request, Error> {
        let uri = self.uri?;
        let uri = if self.params.is_empty() {
            uri
        } else {
            uri.with_extra_query(&self.params)
        };
        Ok(Request {
            method: self.method,
            uri,
            headers: self.headers,
            body: self.body,
            auth: self.auth,
            explicit_authorization: self.explicit_authorization,
            timeout: self.timeout,
            redirect_budget: 10,
        })
    }
}
