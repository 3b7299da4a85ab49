//! RFC-6265-style cookie jar: storage keyed by (domain, path, name), with
//! expiry, secure, host-only attributes.

use std::sync::RwLock;
use std::time::{Duration, SystemTime};

use crate::header::HeaderMap;
use crate::uri::Scheme;

/// A single stored cookie.
#[derive(Debug, Clone)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expires: Option<SystemTime>,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
}

impl Cookie {
    fn is_expired(&self, now: SystemTime) -> bool {
        matches!(self.expires, Some(t) if t <= now)
    }

    fn domain_matches(&self, request_host: &str) -> bool {
        if self.host_only {
            self.domain.eq_ignore_ascii_case(request_host)
        } else {
            let host = request_host.to_ascii_lowercase();
            let domain = self.domain.to_ascii_lowercase();
            host == domain || host.ends_with(&format!(".{domain}"))
        }
    }

    fn path_matches(&self, request_path: &str) -> bool {
        if self.path == request_path {
            return true;
        }
        if request_path.starts_with(&self.path) {
            if self.path.ends_with('/') {
                return true;
            }
            return request_path.as_bytes().get(self.path.len()) == Some(&b'/');
        }
        false
    }
}

/// The client-side cookie store. Readers proceed concurrently; writers take
/// a short exclusive section.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<Vec<Cookie>>,
}

impl CookieJar {
    pub fn new() -> Self {
        CookieJar {
            cookies: RwLock::new(Vec::new()),
        }
    }

    /// Parse every `Set-Cookie` header in `headers` and store it, matched
    /// against the request that produced the response.
    pub fn ingest(&self, headers: &HeaderMap, request_host: &str) {
        for raw in headers.get_all("set-cookie") {
            if let Some(cookie) = parse_set_cookie(raw, request_host) {
                self.store(cookie);
            }
        }
    }

    fn store(&self, cookie: Cookie) {
        let mut cookies = self.cookies.write().unwrap();
        cookies.retain(|c| {
            !(c.domain.eq_ignore_ascii_case(&cookie.domain)
                && c.path == cookie.path
                && c.name == cookie.name)
        });
        cookies.push(cookie);
    }

    /// The `Cookie:` header value for a request to `host`/`path` over
    /// `scheme`, or `None` if nothing matches. Cookies with a longer path
    /// come first.
    pub fn header_for(&self, host: &str, path: &str, scheme: Scheme) -> Option<String> {
        let now = SystemTime::now();
        let is_secure = matches!(scheme, Scheme::Https);

        let mut matching: Vec<Cookie> = {
            let cookies = self.cookies.read().unwrap();
            cookies
                .iter()
                .filter(|c| {
                    !c.is_expired(now)
                        && c.domain_matches(host)
                        && c.path_matches(path)
                        && (!c.secure || is_secure)
                })
                .cloned()
                .collect()
        };

        if matching.is_empty() {
            return None;
        }
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        Some(
            matching
                .into_iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Parse one `Set-Cookie` header value.
fn parse_set_cookie(raw: &str, request_host: &str) -> Option<Cookie> {
    let mut parts = raw.split(';');
    let name_value = parts.next()?.trim();
    let (name, value) = name_value.split_once('=')?;
    let (name, value) = (name.trim().to_string(), value.trim().to_string());
    if name.is_empty() {
        return None;
    }

    let mut domain: Option<String> = None;
    let mut path: Option<String> = None;
    let mut expires: Option<SystemTime> = None;
    let mut max_age: Option<SystemTime> = None;
    let mut secure = false;
    let mut http_only = false;

    for attr in parts {
        let attr = attr.trim();
        let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
        let key_lower = key.trim().to_ascii_lowercase();
        let val = val.trim();
        match key_lower.as_str() {
            "domain" => {
                let d = val.trim_start_matches('.');
                if !d.is_empty() {
                    domain = Some(d.to_ascii_lowercase());
                }
            }
            "path" => {
                if val.starts_with('/') {
                    path = Some(val.to_string());
                }
            }
            "expires" => {
                expires = parse_http_date(val);
            }
            "max-age" => {
                if let Ok(secs) = val.parse::<i64>() {
                    max_age = Some(if secs <= 0 {
                        SystemTime::UNIX_EPOCH
                    } else {
                        SystemTime::now() + Duration::from_secs(secs as u64)
                    });
                }
            }
            "secure" => secure = true,
            "httponly" => http_only = true,
            _ => {}
        }
    }

    let host_only = domain.is_none();
    let domain = match domain {
        Some(d) => {
            let host = request_host.to_ascii_lowercase();
            if host != d && !host.ends_with(&format!(".{d}")) {
                // Domain attribute must be a suffix of the request host.
                return None;
            }
            d
        }
        None => request_host.to_ascii_lowercase(),
    };

    let path = path.unwrap_or_else(|| default_path(request_host));

    Some(Cookie {
        name,
        value,
        domain,
        path,
        // Max-Age wins over Expires when both are present.
        expires: max_age.or(expires),
        secure,
        http_only,
        host_only,
    })
}

fn default_path(_request_host: &str) -> String {
    // The default-path algorithm operates on the request path, which the
    // jar does not see here; callers without an explicit Path attribute
    // effectively scope to "/" which is the common, safe default.
    "/".to_string()
}

/// Minimal RFC 1123 / RFC 850 / asctime date parser, good enough for the
/// `Expires` formats servers actually send.
fn parse_http_date(s: &str) -> Option<SystemTime> {
    // Only the IMF-fixdate form (`Sun, 06 Nov 1994 08:49:37 GMT`) is
    // supported; it is what virtually every server emits.
    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() != 5 {
        return None;
    }
    let day: u64 = parts[1].parse().ok()?;
    let month = month_index(parts[2])?;
    let year: i64 = parts[3].parse().ok()?;
    let time: Vec<&str> = parts[4].split(':').collect();
    if time.len() != 3 {
        return None;
    }
    let (h, m, sec): (u64, u64, u64) =
        (time[0].parse().ok()?, time[1].parse().ok()?, time[2].parse().ok()?);

    let days_since_epoch = days_from_civil(year, month + 1, day);
    let secs = days_since_epoch * 86_400 + h * 3600 + m * 60 + sec;
    Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
}

fn month_index(name: &str) -> Option<u64> {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS.iter().position(|m| m.eq_ignore_ascii_case(&name[..3.min(name.len())])).map(|i| i as u64)
}

/// Howard Hinnant's days-from-civil algorithm (proleptic Gregorian).
fn days_from_civil(y: i64, m: u64, d: u64) -> u64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = (m + 9) % 12;
    let doy = (153 * mp + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    (era as u64 * 146_097 + doe) - 719_468
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::Scheme;

    #[test]
    fn stores_and_emits_host_only_cookie() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.add("Set-Cookie", "k=v; Path=/").unwrap();
        jar.ingest(&headers, "example.com");

        assert_eq!(
            jar.header_for("example.com", "/a", Scheme::Http),
            Some("k=v".to_string())
        );
        assert_eq!(jar.header_for("other.com", "/a", Scheme::Http), None);
    }

    #[test]
    fn secure_cookie_not_sent_over_http() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.add("Set-Cookie", "k=v; Secure; Path=/").unwrap();
        jar.ingest(&headers, "example.com");

        assert_eq!(jar.header_for("example.com", "/", Scheme::Http), None);
        assert_eq!(
            jar.header_for("example.com", "/", Scheme::Https),
            Some("k=v".to_string())
        );
    }

    #[test]
    fn explicit_domain_must_be_suffix_of_request_host() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.add("Set-Cookie", "k=v; Domain=evil.com").unwrap();
        jar.ingest(&headers, "example.com");
        assert_eq!(jar.header_for("example.com", "/", Scheme::Http), None);

        let mut headers = HeaderMap::new();
        headers.add("Set-Cookie", "k=v; Domain=example.com").unwrap();
        jar.ingest(&headers, "sub.example.com");
        assert_eq!(
            jar.header_for("sub.example.com", "/", Scheme::Http),
            Some("k=v".to_string())
        );
    }

    #[test]
    fn newer_insert_overwrites_same_domain_path_name() {
        let jar = CookieJar::new();
        let mut h1 = HeaderMap::new();
        h1.add("Set-Cookie", "k=1; Path=/").unwrap();
        jar.ingest(&h1, "h");
        let mut h2 = HeaderMap::new();
        h2.add("Set-Cookie", "k=2; Path=/").unwrap();
        jar.ingest(&h2, "h");

        assert_eq!(jar.header_for("h", "/", Scheme::Http), Some("k=2".to_string()));
    }
}
