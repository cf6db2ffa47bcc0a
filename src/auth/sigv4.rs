//! AWS Signature Version 4 request signing.
//!
//! Only the header-based variant is implemented, which is all Bedrock runtime
//! and Secrets Manager need. Payloads are always hashed (no unsigned payloads).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};

use super::AwsCredentials;
use crate::util::{amz_date, amz_short_date};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const TERMINATOR: &str = "aws4_request";

#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: AwsCredentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    pub fn new(
        credentials: AwsCredentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    /// Returns the headers that must be added to the request for it to carry a valid signature.
    ///
    /// `headers` are the extra headers the caller will send and wants covered by the
    /// signature (content type, `x-amz-target`, ...). `host` is always derived from `url`.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        body: &[u8],
        now: &DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let amz_date = amz_date(now);
        let short_date = amz_short_date(now);

        let mut canonical_headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), normalize_header_value(value)))
            .collect();
        canonical_headers.insert("host".to_string(), host_header(url));
        canonical_headers.insert("x-amz-date".to_string(), amz_date.clone());
        if let Some(token) = &self.credentials.session_token {
            canonical_headers.insert("x-amz-security-token".to_string(), token.clone());
        }

        let signed_headers = canonical_headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request =
            canonical_request(method, url, &canonical_headers, &signed_headers, body);
        let scope = format!(
            "{}/{}/{}/{}",
            short_date, self.region, self.service, TERMINATOR
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex_sha256(canonical_request.as_bytes())
        );

        let signing_key = self.signing_key(&short_date);
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id
        );

        let mut out = vec![
            ("x-amz-date".to_string(), amz_date),
            ("authorization".to_string(), authorization),
        ];
        if let Some(token) = &self.credentials.session_token {
            out.push(("x-amz-security-token".to_string(), token.clone()));
        }
        out
    }

    fn signing_key(&self, short_date: &str) -> Vec<u8> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac_sha256(secret.as_bytes(), short_date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, TERMINATOR.as_bytes())
    }
}

fn canonical_request(
    method: &str,
    url: &Url,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
    body: &[u8],
) -> String {
    let header_block: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_ascii_uppercase(),
        canonical_uri(url),
        canonical_query(url),
        header_block,
        signed_headers,
        hex_sha256(body)
    )
}

// Non-S3 services expect every path segment to be encoded a second time.
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| uri_encode(segment, true))
        .collect::<Vec<_>>()
        .join("/")
}

fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| (uri_encode(&key, true), uri_encode(&value, true)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// RFC 3986 encoding as AWS defines it: everything but unreserved characters is escaped.
pub(crate) fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
