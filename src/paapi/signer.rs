//! AWS Signature Version 4 for PA-API requests.
//!
//! The remote side recomputes the signature from the same inputs, so header
//! names, ordering and casing here must match what is actually sent.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const KEY_PREFIX: &str = "AWS4";
const SCOPE_TERMINATOR: &str = "aws4_request";

/// Timestamp format used in `X-Amz-Date`.
pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const SCOPE_DATE_FORMAT: &str = "%Y%m%d";

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derives the signing key: HMAC chain over date, region, service and the terminator.
pub fn signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("{KEY_PREFIX}{secret_key}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

/// Canonical header block and the matching `SignedHeaders` list.
///
/// Names are lowercased and sorted; values are trimmed.
pub fn canonical_headers(headers: &[(&str, &str)]) -> (String, String) {
    let mut normalized: Vec<(String, &str)> =
        headers.iter().map(|(name, value)| (name.to_ascii_lowercase(), value.trim())).collect();
    normalized.sort_by(|a, b| a.0.cmp(&b.0));

    let block = normalized.iter().map(|(name, value)| format!("{name}:{value}\n")).collect();
    let signed = normalized.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(";");

    (block, signed)
}

/// Builds the canonical request string.
pub fn canonical_request(
    method: &str,
    uri: &str,
    query: &str,
    headers: &[(&str, &str)],
    payload: &[u8],
) -> (String, String) {
    let (block, signed) = canonical_headers(headers);
    let request =
        format!("{method}\n{uri}\n{query}\n{block}\n{signed}\n{}", sha256_hex(payload));
    (request, signed)
}

/// Builds the string to sign from the canonical request.
pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!("{ALGORITHM}\n{amz_date}\n{scope}\n{}", sha256_hex(canonical_request.as_bytes()))
}

/// Signs requests for one region and service with a fixed key pair.
#[derive(Clone)]
pub struct Signer {
    access_key: String,
    secret_key: String,
    region: String,
    service: String,
}

impl Signer {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    /// Credential scope for the given instant.
    pub fn scope(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}/{}/{}/{SCOPE_TERMINATOR}",
            at.format(SCOPE_DATE_FORMAT),
            self.region,
            self.service
        )
    }

    /// Returns the `Authorization` header value.
    ///
    /// `headers` must include every header that will be signed, `x-amz-date`
    /// among them, formatted from `at`.
    pub fn authorization(
        &self,
        method: &str,
        uri: &str,
        query: &str,
        headers: &[(&str, &str)],
        payload: &[u8],
        at: DateTime<Utc>,
    ) -> String {
        let (canonical, signed_headers) = canonical_request(method, uri, query, headers, payload);
        let scope = self.scope(at);
        let amz_date = at.format(AMZ_DATE_FORMAT).to_string();
        let to_sign = string_to_sign(&amz_date, &scope, &canonical);

        let key = signing_key(
            &self.secret_key,
            &at.format(SCOPE_DATE_FORMAT).to_string(),
            &self.region,
            &self.service,
        );
        let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes()));

        format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EXAMPLE_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    #[test]
    fn test_sha256_of_empty_payload() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_signing_key_known_vector() {
        let key = signing_key(EXAMPLE_SECRET, "20120215", "us-east-1", "iam");
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_canonical_headers_sorted_and_lowercased() {
        let (block, signed) = canonical_headers(&[
            ("X-Amz-Target", "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems"),
            ("Host", " webservices.amazon.com "),
            ("Content-Type", "application/json; charset=utf-8"),
            ("X-Amz-Date", "20240101T000000Z"),
        ]);

        assert_eq!(
            block,
            "content-type:application/json; charset=utf-8\n\
             host:webservices.amazon.com\n\
             x-amz-date:20240101T000000Z\n\
             x-amz-target:com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems\n"
        );
        assert_eq!(signed, "content-type;host;x-amz-date;x-amz-target");
    }

    #[test]
    fn test_canonical_request_layout() {
        let (request, signed) = canonical_request(
            "POST",
            "/paapi5/getitems",
            "",
            &[("host", "webservices.amazon.com"), ("x-amz-date", "20240101T000000Z")],
            b"{}",
        );

        let lines: Vec<&str> = request.split('\n').collect();
        assert_eq!(lines[0], "POST");
        assert_eq!(lines[1], "/paapi5/getitems");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "host:webservices.amazon.com");
        assert_eq!(lines[4], "x-amz-date:20240101T000000Z");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "host;x-amz-date");
        assert_eq!(lines[7], sha256_hex(b"{}"));
        assert_eq!(signed, "host;x-amz-date");
    }

    #[test]
    fn test_string_to_sign_layout() {
        let s = string_to_sign("20240101T000000Z", "20240101/us-east-1/svc/aws4_request", "abc");
        let lines: Vec<&str> = s.split('\n').collect();
        assert_eq!(lines[0], "AWS4-HMAC-SHA256");
        assert_eq!(lines[1], "20240101T000000Z");
        assert_eq!(lines[2], "20240101/us-east-1/svc/aws4_request");
        assert_eq!(lines[3], sha256_hex(b"abc"));
    }

    #[test]
    fn test_get_vanilla_signature() {
        let at = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        let signer = Signer::new("AKIDEXAMPLE", EXAMPLE_SECRET, "us-east-1", "service");

        let auth = signer.authorization(
            "GET",
            "/",
            "",
            &[("Host", "example.amazonaws.com"), ("X-Amz-Date", "20150830T123600Z")],
            b"",
            at,
        );

        assert_eq!(
            auth,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
    }

    #[test]
    fn test_signature_changes_with_payload() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let signer = Signer::new("AK", "SK", "us-east-1", "ProductAdvertisingAPI");
        let headers = [("host", "webservices.amazon.com"), ("x-amz-date", "20240101T000000Z")];

        let a = signer.authorization("POST", "/paapi5/getitems", "", &headers, b"{\"a\":1}", at);
        let b = signer.authorization("POST", "/paapi5/getitems", "", &headers, b"{\"a\":2}", at);
        assert_ne!(a, b);
        assert!(a.contains("Credential=AK/20240101/us-east-1/ProductAdvertisingAPI/aws4_request"));
    }
}
