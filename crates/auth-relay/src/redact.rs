//! Masking of secret values for logs and diagnostic responses.

/// Number of leading characters of a secret that may be shown.
const VISIBLE_PREFIX: usize = 5;

/// Secrets shorter than this are masked completely.
const MIN_PARTIAL_LEN: usize = 12;

/// Return a display-safe version of a secret: the first few characters
/// followed by `...`, or `***` for values too short to reveal any of.
pub fn redact(secret: &str) -> String {
    if secret.chars().count() < MIN_PARTIAL_LEN {
        return "***".to_string();
    }

    let prefix: String = secret.chars().take(VISIBLE_PREFIX).collect();
    format!("{}...", prefix)
}
