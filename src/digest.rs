//! Credential encoding for the Authentication middleware: Basic's base64
//! value, and Digest's HA1/HA2/response computation (RFC 7616), including
//! the `-sess` algorithm variants and `qop=auth`/`auth-int`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest as Sha2Digest, Sha256};

use crate::error::Error;
use crate::header::{parse_structured_value, StructuredValue};

pub fn basic_auth_value(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Md5,
    Md5Sess,
    Sha256,
    Sha256Sess,
}

impl DigestAlgorithm {
    fn parse(s: &str) -> Result<Self, Error> {
        match s.to_ascii_uppercase().as_str() {
            "" | "MD5" => Ok(DigestAlgorithm::Md5),
            "MD5-SESS" => Ok(DigestAlgorithm::Md5Sess),
            "SHA-256" => Ok(DigestAlgorithm::Sha256),
            "SHA-256-SESS" => Ok(DigestAlgorithm::Sha256Sess),
            other => Err(Error::auth(format!("unsupported digest algorithm: {other}"))),
        }
    }

    fn is_sess(self) -> bool {
        matches!(self, DigestAlgorithm::Md5Sess | DigestAlgorithm::Sha256Sess)
    }

    fn hash_hex(self, input: &[u8]) -> String {
        match self {
            DigestAlgorithm::Md5 | DigestAlgorithm::Md5Sess => hex::encode(md5::Md5::digest(input)),
            DigestAlgorithm::Sha256 | DigestAlgorithm::Sha256Sess => {
                hex::encode(Sha256::digest(input))
            }
        }
    }
}

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub qop: Vec<String>,
    pub algorithm: DigestAlgorithm,
}

impl DigestChallenge {
    /// Parse the first `Digest` challenge out of a (possibly
    /// multi-scheme) `WWW-Authenticate` header value.
    pub fn parse(header_value: &str) -> Result<Self, Error> {
        let rest = header_value
            .trim()
            .strip_prefix("Digest")
            .ok_or_else(|| Error::auth("not a Digest challenge"))?;
        let parsed: Vec<StructuredValue> = parse_structured_value(rest);
        // The bare first token after "Digest" parses as an empty-valued
        // structured element whose params are the challenge's key=value
        // pairs.
        let params = parsed.first().ok_or_else(|| Error::auth("empty Digest challenge"))?;

        let realm = params
            .param("realm")
            .ok_or_else(|| Error::auth("Digest challenge missing realm"))?
            .to_string();
        let nonce = params
            .param("nonce")
            .ok_or_else(|| Error::auth("Digest challenge missing nonce"))?
            .to_string();
        let opaque = params.param("opaque").map(str::to_string);
        let qop = params
            .param("qop")
            .map(|q| q.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();
        let algorithm = DigestAlgorithm::parse(params.param("algorithm").unwrap_or(""))?;

        Ok(DigestChallenge {
            realm,
            nonce,
            opaque,
            qop,
            algorithm,
        })
    }

    pub fn prefers_auth_int(&self) -> bool {
        self.qop.iter().any(|q| q == "auth-int") && !self.qop.iter().any(|q| q == "auth")
    }
}

pub fn generate_cnonce() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

#[allow(clippy::too_many_arguments)]
pub fn build_authorization_header(
    challenge: &DigestChallenge,
    user: &str,
    pass: &str,
    method: &str,
    uri: &str,
    body: &[u8],
    cnonce: &str,
    nc: u32,
) -> Result<String, Error> {
    let algorithm = challenge.algorithm;
    let a1 = if algorithm.is_sess() {
        format!(
            "{}:{}:{}",
            algorithm.hash_hex(format!("{user}:{}:{pass}", challenge.realm).as_bytes()),
            challenge.nonce,
            cnonce
        )
    } else {
        format!("{user}:{}:{pass}", challenge.realm)
    };
    let ha1 = algorithm.hash_hex(a1.as_bytes());

    let use_auth_int = challenge.prefers_auth_int();
    let a2 = if use_auth_int {
        format!("{method}:{uri}:{}", algorithm.hash_hex(body))
    } else {
        format!("{method}:{uri}")
    };
    let ha2 = algorithm.hash_hex(a2.as_bytes());

    let qop = if use_auth_int {
        "auth-int"
    } else if challenge.qop.iter().any(|q| q == "auth") {
        "auth"
    } else {
        ""
    };

    let nc_str = format!("{nc:08x}");
    let response = if qop.is_empty() {
        algorithm.hash_hex(format!("{ha1}:{}:{ha2}", challenge.nonce).as_bytes())
    } else {
        algorithm.hash_hex(
            format!("{ha1}:{}:{nc_str}:{cnonce}:{qop}:{ha2}", challenge.nonce).as_bytes(),
        )
    };

    let algorithm_str = match algorithm {
        DigestAlgorithm::Md5 => "MD5",
        DigestAlgorithm::Md5Sess => "MD5-sess",
        DigestAlgorithm::Sha256 => "SHA-256",
        DigestAlgorithm::Sha256Sess => "SHA-256-sess",
    };

    let mut header = format!(
        r#"Digest username="{user}", realm="{}", nonce="{}", uri="{uri}", algorithm={algorithm_str}, response="{response}""#,
        challenge.realm, challenge.nonce
    );
    if !qop.is_empty() {
        header.push_str(&format!(r#", qop={qop}, nc={nc_str}, cnonce="{cnonce}""#));
    }
    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(r#", opaque="{opaque}""#));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_matches_known_vector() {
        assert_eq!(basic_auth_value("Aladdin", "open sesame"), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn parses_digest_challenge() {
        let header = r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;
        let challenge = DigestChallenge::parse(header).unwrap();
        assert_eq!(challenge.realm, "testrealm@host.com");
        assert_eq!(challenge.qop, vec!["auth", "auth-int"]);
        assert_eq!(challenge.algorithm, DigestAlgorithm::Md5);
    }

    #[test]
    fn builds_rfc2069_style_response_without_qop() {
        // Classic RFC 2069 example vector (no qop).
        let challenge = DigestChallenge {
            realm: "testrealm@host.com".into(),
            nonce: "dcd98b7102dd2f0e8b11d0f600bfb0c093".into(),
            opaque: Some("5ccc069c403ebaf9f0171e9517f40e41".into()),
            qop: Vec::new(),
            algorithm: DigestAlgorithm::Md5,
        };
        let header = build_authorization_header(
            &challenge,
            "Mufasa",
            "Circle Of Life",
            "GET",
            "/dir/index.html",
            b"",
            "0a4f113b",
            1,
        )
        .unwrap();
        assert!(header.contains(r#"response="6629fae49393a05397450978507c4ef1""#));
    }
}
