//! Case-insensitive, order-preserving, multi-value header map, plus a
//! structured-value parser shared by `Accept-Encoding` composition and the
//! Digest `WWW-Authenticate` challenge parser.

use std::fmt;

use crate::error::Error;

#[derive(Debug, Clone)]
struct Field {
    name: String,
    value: String,
}

/// An ordered, case-insensitive, multi-valued header collection.
///
/// Insertion order is preserved on first use of a name; later `add` calls
/// for the same name append rather than move it. `Set-Cookie` and
/// `WWW-Authenticate` style fields are never comma-joined: each `add` stays
/// a distinct entry.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    fields: Vec<Field>,
}

impl HeaderMap {
    pub fn new() -> Self {
        HeaderMap { fields: Vec::new() }
    }

    /// First value for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    /// All values for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Replace all existing values for `name` with a single new one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), Error> {
        let name = name.into();
        let value = value.into();
        validate_field(&name, &value)?;
        self.fields.retain(|f| !f.name.eq_ignore_ascii_case(&name));
        self.fields.push(Field { name, value });
        Ok(())
    }

    /// Append a new value for `name`, keeping any existing ones.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), Error> {
        let name = name.into();
        let value = value.into();
        validate_field(&name, &value)?;
        self.fields.push(Field { name, value });
        Ok(())
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|f| !f.name.eq_ignore_ascii_case(name));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|f| (f.name.as_str(), f.value.as_str()))
    }
}

impl fmt::Display for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

fn validate_field(name: &str, value: &str) -> Result<(), Error> {
    if name.is_empty() || !name.bytes().all(is_token_char) {
        return Err(Error::protocol(format!("invalid header name: {name}")));
    }
    if value.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(Error::protocol("CR/LF injection in header value"));
    }
    Ok(())
}

fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// One comma-separated element of a structured header value, with any
/// `;key=value` parameters and a convenience accessor for `;q=`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredValue {
    pub value: String,
    pub params: Vec<(String, String)>,
}

impl StructuredValue {
    pub fn q(&self) -> f32 {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("q"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(1.0)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Split a header value on commas outside quoted strings, then each element
/// on `;` outside quotes, treating the first segment as the bare value and
/// the rest as `key=value` (or bare-flag) parameters. Used for
/// `Accept`/`Accept-Encoding` composition and for `WWW-Authenticate`
/// challenge lists.
pub fn parse_structured_value(input: &str) -> Vec<StructuredValue> {
    split_outside_quotes(input, ',')
        .into_iter()
        .map(|elem| {
            let mut segments = split_outside_quotes(&elem, ';').into_iter();
            let value = segments.next().unwrap_or_default().trim().to_string();
            let params = segments
                .map(|seg| {
                    let seg = seg.trim();
                    match seg.split_once('=') {
                        Some((k, v)) => (k.trim().to_string(), unquote(v.trim())),
                        None => (seg.to_string(), String::new()),
                    }
                })
                .collect();
            StructuredValue { value, params }
        })
        .collect()
}

fn split_outside_quotes(input: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c == sep && !in_quotes => {
                out.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    out.push(current);
    out
}

fn unquote(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].replace("\\\"", "\"")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_get_preserves_wire_case() {
        let mut h = HeaderMap::new();
        h.add("Content-Type", "text/plain").unwrap();
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert_eq!(h.iter().next(), Some(("Content-Type", "text/plain")));
    }

    #[test]
    fn add_does_not_replace_set_does() {
        let mut h = HeaderMap::new();
        h.add("Set-Cookie", "a=1").unwrap();
        h.add("Set-Cookie", "b=2").unwrap();
        assert_eq!(h.get_all("set-cookie"), vec!["a=1", "b=2"]);

        h.set("X-Foo", "1").unwrap();
        h.set("X-Foo", "2").unwrap();
        assert_eq!(h.get_all("x-foo"), vec!["2"]);
    }

    #[test]
    fn rejects_crlf_injection() {
        let mut h = HeaderMap::new();
        assert!(h.set("X-Foo", "bar\r\nEvil: 1").is_err());
    }

    #[test]
    fn parses_structured_q_values() {
        let v = parse_structured_value("gzip;q=1, deflate;q=0.5, identity;q=0");
        assert_eq!(v.len(), 3);
        assert_eq!(v[0].value, "gzip");
        assert_eq!(v[0].q(), 1.0);
        assert_eq!(v[1].q(), 0.5);
    }

    #[test]
    fn structured_value_respects_quotes() {
        // The comma inside the quoted parameter value must not split the element.
        let v = parse_structured_value(r#"foo;realm="a, b""#);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].value, "foo");
        assert_eq!(v[0].param("realm"), Some("a, b"));
    }
}
