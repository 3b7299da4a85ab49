//! Request serialization: request line, `Host`, `Content-Length` or
//! `Transfer-Encoding: chunked`, default `Accept-Encoding`.

use crate::cookie::CookieJar;
use crate::request::Request;
use crate::uri::Scheme;

/// Render the request line + headers (everything up to and including the
/// terminating blank line). The body, if any, is written separately by the
/// transport so that streamed bodies never need to be buffered here.
pub fn serialize_head(req: &Request, jar: Option<&CookieJar>, suppress_accept_encoding: bool) -> String {
    let mut out = String::new();
    out.push_str(req.method.as_str());
    out.push(' ');
    out.push_str(&req.uri.request_target());
    out.push_str(" HTTP/1.1\r\n");

    if !req.headers.contains("host") {
        out.push_str(&format!("Host: {}\r\n", req.uri.host_header_value()));
    }

    let chunked = req
        .headers
        .get("transfer-encoding")
        .map(|v| v.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false);

    if !chunked && !req.headers.contains("content-length") {
        if let Some(len) = req.body.known_length() {
            if len > 0 || matches!(req.method, crate::request::Method::Post | crate::request::Method::Put | crate::request::Method::Patch) {
                out.push_str(&format!("Content-Length: {len}\r\n"));
            }
        } else {
            out.push_str("Transfer-Encoding: chunked\r\n");
        }
    }

    // `req.auth` is intentionally NOT turned into a preemptive
    // `Authorization` header here: credentials are withheld until a 401
    // challenge arrives. `AuthenticationMiddleware` adds the header on retry.

    if !suppress_accept_encoding && !req.headers.contains("accept-encoding") {
        out.push_str("Accept-Encoding: gzip; q=1, deflate; q=1\r\n");
    }

    if let Some(jar) = jar {
        if let Some(cookie_header) = jar.header_for(req.uri.host(), req.uri.path(), req.uri.scheme()) {
            out.push_str(&format!("Cookie: {cookie_header}\r\n"));
        }
    }

    for (name, value) in req.headers.iter() {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }

    out.push_str("\r\n");
    out
}

/// Wrap a body chunk in `<hex-size>\r\n<data>\r\n` chunked framing.
pub fn encode_chunk(data: &[u8]) -> Vec<u8> {
    let mut out = format!("{:x}\r\n", data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend_from_slice(b"\r\n");
    out
}

/// The terminating zero-size chunk with no trailers.
pub fn encode_final_chunk() -> &'static [u8] {
    b"0\r\n\r\n"
}

pub fn default_user_agent() -> &'static str {
    concat!("aioreq-rs/", env!("CARGO_PKG_VERSION"))
}

pub(crate) fn scheme_default_port(scheme: Scheme) -> u16 {
    scheme.default_port()
}
