/// Canonical request signing.
///
/// A signed body is the payload's own JSON with two fields spliced onto the end:
///
/// ```text
/// {<payload fields>,"ts":<unix-seconds>,"sig":"<hex hmac-sha256>"}
/// ```
///
/// The HMAC covers `{<payload fields>,"ts":<n>}` byte for byte, so the payload is
/// serialized exactly once and never re-ordered.
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::credentials::Credentials;
use crate::errors::BitkubError;

type HmacSha256 = Hmac<Sha256>;

/// Keys appended at signing time; payloads may not carry them.
const RESERVED_KEYS: [&str; 2] = ["ts", "sig"];

/// Incrementally builds a signed request body.
///
/// Every key may appear once. `ts` and `sig` are reserved for signing.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    // Always holds an unterminated object: `{` or `{"a":1`.
    buf: Vec<u8>,
    keys: BTreeSet<String>,
}

impl EnvelopeBuilder {
    /// Start an envelope with no payload.
    pub fn empty() -> Self {
        Self {
            buf: vec![b'{'],
            keys: BTreeSet::new(),
        }
    }

    /// Start an envelope from `payload`, which must serialize to a JSON object.
    ///
    /// `None`, `null` and `{}` all produce an empty envelope.
    pub fn new<P: Serialize + ?Sized>(payload: Option<&P>) -> Result<Self, BitkubError> {
        let Some(payload) = payload else {
            return Ok(Self::empty());
        };
        let mut buf = serde_json::to_vec(payload)
            .map_err(|e| BitkubError::InvalidRequest(format!("payload serialization: {e}")))?;

        if buf == b"null" || buf == b"{}" {
            return Ok(Self::empty());
        }
        if buf.first() != Some(&b'{') || buf.last() != Some(&b'}') {
            return Err(BitkubError::InvalidRequest(
                "signed payload must serialize to a JSON object".into(),
            ));
        }
        let fields: Map<String, Value> = serde_json::from_slice(&buf)
            .map_err(|e| BitkubError::InvalidRequest(format!("payload: {e}")))?;
        if let Some(key) = RESERVED_KEYS.iter().find(|key| fields.contains_key(**key)) {
            return Err(BitkubError::InvalidRequest(format!(
                "payload field {key:?} is reserved for signing"
            )));
        }
        buf.pop();
        Ok(Self {
            buf,
            keys: fields.into_iter().map(|(key, _)| key).collect(),
        })
    }

    /// Append a field after everything already written.
    ///
    /// Fails if `name` is reserved or already present.
    pub fn field<V: Serialize + ?Sized>(mut self, name: &str, value: &V) -> Result<Self, BitkubError> {
        if RESERVED_KEYS.iter().any(|key| *key == name) {
            return Err(BitkubError::InvalidRequest(format!(
                "field {name:?} is reserved for signing"
            )));
        }
        if self.keys.contains(name) {
            return Err(BitkubError::InvalidRequest(format!(
                "field {name:?} is already present"
            )));
        }
        self.push_key(name)?;
        self.keys.insert(name.to_string());
        serde_json::to_writer(&mut self.buf, value)
            .map_err(|e| BitkubError::InvalidRequest(format!("field {name}: {e}")))?;
        Ok(self)
    }

    /// Stamp the current time, sign, and return the finished body.
    pub fn sign(self, credentials: &Credentials) -> Result<Vec<u8>, BitkubError> {
        self.sign_at(credentials, unix_now()?)
    }

    pub(crate) fn sign_at(mut self, credentials: &Credentials, ts: i64) -> Result<Vec<u8>, BitkubError> {
        self.push_key("ts")?;
        self.buf.extend_from_slice(ts.to_string().as_bytes());
        self.buf.push(b'}');

        let sig = hmac_sha256_hex(credentials.secret(), &self.buf)?;

        self.buf.pop();
        self.buf.extend_from_slice(b",\"sig\":\"");
        self.buf.extend_from_slice(sig.as_bytes());
        self.buf.extend_from_slice(b"\"}");
        Ok(self.buf)
    }

    fn push_key(&mut self, name: &str) -> Result<(), BitkubError> {
        if self.buf.len() > 1 {
            self.buf.push(b',');
        }
        serde_json::to_writer(&mut self.buf, name)
            .map_err(|e| BitkubError::InvalidRequest(format!("field name {name}: {e}")))?;
        self.buf.push(b':');
        Ok(())
    }
}

/// Sign `payload` (or an empty object) with the current timestamp.
pub fn sign_payload<P: Serialize + ?Sized>(
    payload: Option<&P>,
    credentials: &Credentials,
) -> Result<Vec<u8>, BitkubError> {
    EnvelopeBuilder::new(payload)?.sign(credentials)
}

/// Lowercase hex HMAC-SHA256 of `message` keyed by `secret`.
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> Result<String, BitkubError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| BitkubError::InvalidCredentials(format!("HMAC key: {e}")))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Current Unix time in whole seconds.
pub fn unix_now() -> Result<i64, BitkubError> {
    unix_seconds(SystemTime::now())
}

fn unix_seconds(at: SystemTime) -> Result<i64, BitkubError> {
    let elapsed = at
        .duration_since(UNIX_EPOCH)
        .map_err(|_| BitkubError::InvalidRequest("system clock is before the Unix epoch".into()))?;
    i64::try_from(elapsed.as_secs())
        .map_err(|_| BitkubError::InvalidRequest("system clock is out of range".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds() -> Credentials {
        Credentials::new("key", "secret")
    }

    #[test]
    fn empty_envelope_exact_bytes() {
        let body = EnvelopeBuilder::empty().sign_at(&creds(), 1620000000).unwrap();
        let sig = hmac_sha256_hex(b"secret", br#"{"ts":1620000000}"#).unwrap();
        let expected = format!(r#"{{"ts":1620000000,"sig":"{sig}"}}"#);
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn payload_envelope_exact_bytes() {
        #[derive(Serialize)]
        struct Req {
            sym: &'static str,
            amt: u32,
        }
        let body = EnvelopeBuilder::new(Some(&Req { sym: "THB_BTC", amt: 1000 }))
            .unwrap()
            .sign_at(&creds(), 1620000000)
            .unwrap();
        let signed = br#"{"sym":"THB_BTC","amt":1000,"ts":1620000000}"#;
        let sig = hmac_sha256_hex(b"secret", signed).unwrap();
        let expected = format!(r#"{{"sym":"THB_BTC","amt":1000,"ts":1620000000,"sig":"{sig}"}}"#);
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn extra_fields_land_before_ts() {
        let body = EnvelopeBuilder::new(Some(&json!({"sym": "THB_BTC"})))
            .unwrap()
            .field("p", &2)
            .unwrap()
            .field("lmt", &50)
            .unwrap()
            .sign_at(&creds(), 7)
            .unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(r#"{"sym":"THB_BTC","p":2,"lmt":50,"ts":7,"sig":""#));
    }

    #[test]
    fn empty_object_and_null_payloads_are_absent() {
        let a = EnvelopeBuilder::new(Some(&json!({}))).unwrap().sign_at(&creds(), 1).unwrap();
        let b = EnvelopeBuilder::new(Some(&json!(null))).unwrap().sign_at(&creds(), 1).unwrap();
        let c = EnvelopeBuilder::new::<serde_json::Value>(None).unwrap().sign_at(&creds(), 1).unwrap();
        assert_eq!(a, c);
        assert_eq!(b, c);
        assert!(a.starts_with(br#"{"ts":1,"#));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = EnvelopeBuilder::new(Some(&json!([1, 2]))).unwrap_err();
        assert!(matches!(err, BitkubError::InvalidRequest(_)));
        let err = EnvelopeBuilder::new(Some("text")).unwrap_err();
        assert!(matches!(err, BitkubError::InvalidRequest(_)));
    }

    #[test]
    fn reserved_payload_keys_are_rejected() {
        for payload in [json!({"ts": 1}), json!({"sym": "THB_BTC", "sig": "x"})] {
            let err = EnvelopeBuilder::new(Some(&payload)).unwrap_err();
            assert!(err.to_string().contains("reserved"), "{err}");
        }
        let err = EnvelopeBuilder::empty().field("ts", &1).unwrap_err();
        assert!(matches!(err, BitkubError::InvalidRequest(_)));
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = EnvelopeBuilder::new(Some(&json!({"p": 1})))
            .unwrap()
            .field("p", &2)
            .unwrap_err();
        assert!(err.to_string().contains("already present"), "{err}");

        let err = EnvelopeBuilder::empty()
            .field("lmt", &1)
            .unwrap()
            .field("lmt", &1)
            .unwrap_err();
        assert!(matches!(err, BitkubError::InvalidRequest(_)));
    }

    #[test]
    fn clock_before_epoch_is_an_error() {
        let before = UNIX_EPOCH - std::time::Duration::from_secs(1);
        let err = unix_seconds(before).unwrap_err();
        assert!(err.to_string().contains("before the Unix epoch"), "{err}");
        assert_eq!(unix_seconds(UNIX_EPOCH + std::time::Duration::from_secs(42)).unwrap(), 42);
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let sig = hmac_sha256_hex(b"k", b"m").unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn known_hmac_vector() {
        // RFC 4231 test case 2.
        let sig = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
