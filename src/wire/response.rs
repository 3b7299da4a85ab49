//! Status-line/header parsing and body-framing selection.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::Error;
use crate::header::HeaderMap;
use crate::request::Method;

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub code: u16,
    pub reason: String,
}

/// How to read the body once headers are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// 1xx/204/304 responses and all responses to HEAD: no body.
    None,
    Chunked,
    ContentLength(u64),
    /// No framing header at all: read until EOF, connection becomes
    /// non-reusable.
    UntilClose,
}

/// Read one CRLF- (or bare-LF-, tolerated here) terminated line, with the
/// terminator stripped.
async fn read_line<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<String, Error> {
    let mut buf = Vec::new();
    let n = r
        .read_until(b'\n', &mut buf)
        .await
        .map_err(Error::read)?;
    if n == 0 {
        return Err(Error::protocol("connection closed before status line"));
    }
    while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
        buf.pop();
    }
    String::from_utf8(buf).map_err(|_| Error::protocol("non-UTF-8 header line"))
}

pub async fn parse_status_line<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<StatusLine, Error> {
    let line = read_line(r).await?;
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    let code = parts.next().unwrap_or("");
    let reason = parts.next().unwrap_or("").to_string();

    if !version.eq_ignore_ascii_case("HTTP/1.1") && !version.eq_ignore_ascii_case("HTTP/1.0") {
        return Err(Error::protocol(format!("unsupported HTTP version: {version}")));
    }
    let code: u16 = code
        .parse()
        .map_err(|_| Error::protocol(format!("bad status code: {code}")))?;
    if !(100..=599).contains(&code) {
        return Err(Error::protocol(format!("status code out of range: {code}")));
    }

    Ok(StatusLine { code, reason })
}

/// Read headers until the terminating blank line. Rejects obsolete
/// line-folding continuations (a line starting with space/tab).
pub async fn parse_headers<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    loop {
        let line = read_line(r).await?;
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            return Err(Error::protocol("obsolete header line folding is not supported"));
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::protocol(format!("malformed header line: {line}")))?;
        headers
            .add(name.trim(), value.trim())
            .map_err(|_| Error::protocol(format!("malformed header line: {line}")))?;
    }

    validate_content_length(&headers)?;
    Ok(headers)
}

fn validate_content_length(headers: &HeaderMap) -> Result<(), Error> {
    let values = headers.get_all("content-length");
    if values.len() > 1 && !values.windows(2).all(|w| w[0] == w[1]) {
        return Err(Error::protocol("conflicting Content-Length headers"));
    }
    Ok(())
}

/// Apply the body-framing rules in order: no-body statuses/methods first,
/// then `Transfer-Encoding: chunked`, then `Content-Length`, then
/// read-until-close.
pub fn determine_framing(method: Method, status: u16, headers: &HeaderMap) -> Result<BodyFraming, Error> {
    if (100..200).contains(&status) || status == 204 || status == 304 || method == Method::Head {
        return Ok(BodyFraming::None);
    }

    if let Some(te) = headers.get("transfer-encoding") {
        if te.to_ascii_lowercase().contains("chunked") {
            return Ok(BodyFraming::Chunked);
        }
    }

    if let Some(len) = headers.get("content-length") {
        let len: u64 = len
            .trim()
            .parse()
            .map_err(|_| Error::protocol(format!("bad Content-Length: {len}")))?;
        return Ok(BodyFraming::ContentLength(len));
    }

    Ok(BodyFraming::UntilClose)
}
