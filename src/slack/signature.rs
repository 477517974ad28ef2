//! Slack request signature verification
//!
//! Implements the v0 signing scheme: HMAC-SHA256 over
//! `v0:{timestamp}:{body}`, hex-encoded, compared in constant time.
//! Requests outside the replay window are rejected before any HMAC work.

use super::SlackError;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_VERSION: &str = "v0";

/// Replay window; requests with an older timestamp are rejected
const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

/// Verify the `X-Slack-Signature` of a request against its raw body.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> Result<(), SlackError> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SlackError::InvalidTimestamp)?;

    if (Utc::now().timestamp() - ts).abs() > MAX_TIMESTAMP_SKEW_SECS {
        return Err(SlackError::StaleTimestamp);
    }

    let presented = signature
        .strip_prefix(&format!("{}=", SIGNATURE_VERSION))
        .ok_or(SlackError::SignatureMismatch)?;
    let presented = hex::decode(presented).map_err(|_| SlackError::SignatureMismatch)?;

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| SlackError::SignatureMismatch)?;
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.trim().as_bytes());
    mac.update(b":");
    mac.update(body);

    // Constant-time comparison
    mac.verify_slice(&presented)
        .map_err(|_| SlackError::SignatureMismatch)
}

#[cfg(test)]
fn compute_signature(signing_secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes()).unwrap();
    mac.update(format!("{}:{}:", SIGNATURE_VERSION, timestamp).as_bytes());
    mac.update(body);
    format!("{}={}", SIGNATURE_VERSION, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

    /// Worked example from Slack's request-signing documentation.
    #[test]
    fn matches_published_slack_vector() {
        let body = "token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebinar&text=bob&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
        let signature = compute_signature(SECRET, "1531420618", body.as_bytes());
        assert_eq!(
            signature,
            "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"
        );
    }

    #[test]
    fn accepts_a_freshly_signed_request() {
        let timestamp = Utc::now().timestamp().to_string();
        let body = b"command=%2Fstatus&user_name=roadrunner";
        let signature = compute_signature(SECRET, &timestamp, body);

        assert!(verify_signature(SECRET, &timestamp, body, &signature).is_ok());
    }

    #[test]
    fn rejects_wrong_secret() {
        let timestamp = Utc::now().timestamp().to_string();
        let body = b"command=%2Fstatus";
        let signature = compute_signature("some-other-secret", &timestamp, body);

        assert!(matches!(
            verify_signature(SECRET, &timestamp, body, &signature),
            Err(SlackError::SignatureMismatch)
        ));
    }

    #[test]
    fn rejects_tampered_body() {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = compute_signature(SECRET, &timestamp, b"command=%2Fstatus");

        assert!(matches!(
            verify_signature(SECRET, &timestamp, b"command=%2Flogtime", &signature),
            Err(SlackError::SignatureMismatch)
        ));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let timestamp = (Utc::now().timestamp() - 3600).to_string();
        let body = b"command=%2Fstatus";
        let signature = compute_signature(SECRET, &timestamp, body);

        assert!(matches!(
            verify_signature(SECRET, &timestamp, body, &signature),
            Err(SlackError::StaleTimestamp)
        ));
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        assert!(matches!(
            verify_signature(SECRET, "not-a-number", b"", "v0=00"),
            Err(SlackError::InvalidTimestamp)
        ));
    }

    #[test]
    fn rejects_missing_version_prefix_and_bad_hex() {
        let timestamp = Utc::now().timestamp().to_string();
        assert!(matches!(
            verify_signature(SECRET, &timestamp, b"", "a2114d57"),
            Err(SlackError::SignatureMismatch)
        ));
        assert!(matches!(
            verify_signature(SECRET, &timestamp, b"", "v0=zzzz"),
            Err(SlackError::SignatureMismatch)
        ));
    }
}
