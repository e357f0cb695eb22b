//! Grants carried in an access token's JWT payload.
//!
//! The payload is read without verifying the signature. It only decides which
//! redirect a route guard issues; the backend still authorizes every call.

use access_gate::Grants;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::debug;

/// Decode `{permissions, roles}` from the token payload.
///
/// Returns `None` for anything that is not a three-part JWT with a JSON
/// payload, so callers can deny by default.
pub fn decode_grants(token: &str) -> Option<Grants> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            debug!("Token is not a JWT");
            return None;
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| debug!(error = %e, "Token payload is not base64url"))
        .ok()?;
    serde_json::from_slice::<Grants>(&bytes)
        .map_err(|e| debug!(error = %e, "Token payload is not a grants object"))
        .ok()
}

#[cfg(test)]
pub(crate) fn encode_test_token(grants: &Grants, signature: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(grants).unwrap());
    format!("{header}.{payload}.{signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_grants() {
        let grants = Grants::new(["metrics.list"], ["editor"]);
        let token = encode_test_token(&grants, "sig");
        assert_eq!(decode_grants(&token), Some(grants));
    }

    #[test]
    fn test_missing_claims_default_to_empty() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"user@example.com"}"#);
        let token = format!("h.{payload}.s");
        assert_eq!(decode_grants(&token), Some(Grants::default()));
    }

    #[test]
    fn test_undecodable_tokens() {
        assert_eq!(decode_grants("opaque-token"), None);
        assert_eq!(decode_grants("a.b.c.d"), None);
        assert_eq!(decode_grants("h.!!!.s"), None);

        let not_json = URL_SAFE_NO_PAD.encode(b"plain text");
        assert_eq!(decode_grants(&format!("h.{not_json}.s")), None);
    }
}
