//! An absolute http(s) URI: scheme, userinfo, host, port, path, query,
//! fragment. The fragment is parsed and then discarded; it never hits the
//! wire.

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::error::Error;

/// `http` or `https`. Only these two are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `name=value` query pair, in the order it appeared on the wire.
pub type QueryPair = (String, String);

/// The `(scheme, host, port)` tuple a connection pool partitions on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

/// A parsed, absolute http(s) URI.
///
/// Equality is case-insensitive on scheme/host and exact on path/query.
#[derive(Debug, Clone)]
pub struct Uri {
    scheme: Scheme,
    userinfo: Option<(String, String)>,
    host: String,
    port: u16,
    path: String,
    query: Vec<QueryPair>,
}

impl Uri {
    /// Parse an absolute `http(s)://...` URI per RFC 3986, restricted to
    /// the `http`/`https` schemes. Rejects relative references.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let (scheme_str, rest) = input
            .split_once("://")
            .ok_or_else(|| Error::InvalidUri(format!("not an absolute URI: {input}")))?;

        let scheme = match scheme_str.to_ascii_lowercase().as_str() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(Error::InvalidUri(format!("unsupported scheme: {other}"))),
        };

        // Strip fragment first: never goes on the wire.
        let rest = rest.split('#').next().unwrap_or("");

        let (authority, path_and_query) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        if authority.is_empty() {
            return Err(Error::InvalidUri(format!("missing host: {input}")));
        }

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((info, hp)) => {
                let (user, pass) = info.split_once(':').unwrap_or((info, ""));
                (
                    Some((
                        percent_decode_str(user).decode_utf8_lossy().into_owned(),
                        percent_decode_str(pass).decode_utf8_lossy().into_owned(),
                    )),
                    hp,
                )
            }
            None => (None, authority),
        };

        let (host, port) = if let Some(idx) = host_port.rfind(':') {
            // Guard against bare IPv6 literals without brackets; we don't
            // support zone IDs or bracketed IPv6, which is out of scope here.
            let (h, p) = host_port.split_at(idx);
            let p = &p[1..];
            if p.is_empty() {
                (h, scheme.default_port())
            } else {
                let port: u16 = p
                    .parse()
                    .map_err(|_| Error::InvalidUri(format!("bad port: {p}")))?;
                (h, port)
            }
        } else {
            (host_port, scheme.default_port())
        };

        if host.is_empty() {
            return Err(Error::InvalidUri(format!("empty host: {input}")));
        }

        let (path, query_str) = match path_and_query.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path_and_query, None),
        };

        let path = if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        };

        let query = query_str
            .map(parse_query)
            .transpose()?
            .unwrap_or_default();

        Ok(Uri {
            scheme,
            userinfo,
            host: idn_lowercase(host),
            port,
            path,
            query,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[QueryPair] {
        &self.query
    }

    pub fn userinfo(&self) -> Option<&(String, String)> {
        self.userinfo.as_ref()
    }

    pub fn connection_key(&self) -> ConnectionKey {
        ConnectionKey {
            scheme: self.scheme,
            host: self.host.clone(),
            port: self.port,
        }
    }

    /// `host` or `host:port` for the `Host` header, eliding the port when
    /// it's the scheme default.
    pub fn host_header_value(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// `path?query`, never the fragment — the HTTP/1.1 `request-target`.
    pub fn request_target(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, encode_query(&self.query))
        }
    }

    /// Append extra query pairs (used by `RequestBuilder::param`).
    pub fn with_extra_query(&self, extra: &[QueryPair]) -> Uri {
        let mut query = self.query.clone();
        query.extend(extra.iter().cloned());
        Uri {
            query,
            ..self.clone()
        }
    }

    /// Resolve a `Location` header value against `self`, per RFC 3986 §5 for
    /// the subset of cases redirects actually produce (absolute URI or
    /// absolute-path reference).
    pub fn resolve(&self, location: &str) -> Result<Uri, Error> {
        if location.contains("://") {
            return Uri::parse(location);
        }
        if let Some(path_and_query) = location.strip_prefix('/') {
            let full = format!(
                "{}://{}/{}",
                self.scheme.as_str(),
                self.authority_str(),
                path_and_query
            );
            return Uri::parse(&full);
        }
        // Relative reference against the current path's directory.
        let base_dir = match self.path.rfind('/') {
            Some(idx) => &self.path[..=idx],
            None => "/",
        };
        let full = format!(
            "{}://{}{}{}",
            self.scheme.as_str(),
            self.authority_str(),
            base_dir,
            location
        );
        Uri::parse(&full)
    }

    fn authority_str(&self) -> String {
        self.host_header_value()
    }
}

impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.host.eq_ignore_ascii_case(&other.host)
            && self.port == other.port
            && self.path == other.path
            && self.query == other.query
    }
}
impl Eq for Uri {}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}{}",
            self.scheme,
            self.host_header_value(),
            self.request_target()
        )
    }
}

fn idn_lowercase(host: &str) -> String {
    // Real IDNA normalization is out of scope; ASCII lowercasing covers the
    // overwhelming majority of hosts a client will ever see, and punycode
    // (`xn--`) labels are already ASCII.
    host.to_ascii_lowercase()
}

fn parse_query(q: &str) -> Result<Vec<QueryPair>, Error> {
    if q.is_empty() {
        return Ok(Vec::new());
    }
    q.split('&')
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            Ok((
                percent_decode_str(k).decode_utf8_lossy().into_owned(),
                percent_decode_str(v).decode_utf8_lossy().into_owned(),
            ))
        })
        .collect()
}

fn encode_query(pairs: &[QueryPair]) -> String {
    use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
    const QUERY_ENCODE: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'&').add(b'=');

    pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_ENCODE),
                utf8_percent_encode(v, QUERY_ENCODE)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_uri() {
        let uri = Uri::parse("http://Example.COM/a/b?x=1&y=2#frag").unwrap();
        assert_eq!(uri.host(), "example.com");
        assert_eq!(uri.port(), 80);
        assert_eq!(uri.path(), "/a/b");
        assert_eq!(uri.query(), &[("x".into(), "1".into()), ("y".into(), "2".into())]);
        assert_eq!(uri.request_target(), "/a/b?x=1&y=2");
    }

    #[test]
    fn default_ports_elided_from_host_header() {
        let http = Uri::parse("http://h/").unwrap();
        assert_eq!(http.host_header_value(), "h");
        let https = Uri::parse("https://h:443/").unwrap();
        assert_eq!(https.host_header_value(), "h");
        let custom = Uri::parse("http://h:8080/").unwrap();
        assert_eq!(custom.host_header_value(), "h:8080");
    }

    #[test]
    fn extracts_userinfo() {
        let uri = Uri::parse("http://user:pass@h/p").unwrap();
        assert_eq!(uri.userinfo(), Some(&("user".to_string(), "pass".to_string())));
    }

    #[test]
    fn rejects_non_absolute() {
        assert!(Uri::parse("/just/a/path").is_err());
        assert!(Uri::parse("ftp://h/").is_err());
    }

    #[test]
    fn resolves_redirect_locations() {
        let base = Uri::parse("http://h/a/b").unwrap();
        assert_eq!(base.resolve("/c").unwrap().to_string(), "http://h/c");
        assert_eq!(
            base.resolve("https://other/x").unwrap().to_string(),
            "https://other/x"
        );
    }

    #[test]
    fn equality_is_case_insensitive_on_host() {
        let a = Uri::parse("http://Host/p").unwrap();
        let b = Uri::parse("http://host/p").unwrap();
        assert_eq!(a, b);
    }
}
