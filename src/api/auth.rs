//! Shared-secret check for task submissions.
//!
//! There are no sessions or tokens: every brief carries a `secret` field that
//! must equal the configured `SHARED_SECRET`. With no secret configured, every
//! submission is rejected.

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for i in 0..a_bytes.len() {
        diff |= a_bytes[i] ^ b_bytes[i];
    }
    diff == 0
}

/// True iff the raw request carries a string `secret` equal to `expected`.
pub fn secret_matches(raw: &serde_json::Value, expected: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|s| !s.is_empty()) else {
        return false;
    };
    match raw.get("secret").and_then(|v| v.as_str()) {
        Some(provided) => constant_time_eq(provided, expected),
        None => {
            // Keep timing independent of whether the field was present.
            let _ = constant_time_eq(expected, expected);
            false
        }
    }
}
