//! URL canonicalization and cache fingerprints.
//!
//! Two inputs that name the same page should share one cache entry, so the
//! canonical form keeps only the host and path. Case, port, trailing
//! slashes, query string, fragment and the http/https distinction are all
//! dropped.
//!
//! ```rust
//! use clonetime_core::normalize::normalize_url;
//!
//! assert_eq!(
//!     normalize_url("HTTP://Example.com/Path/?utm_source=x#top").unwrap(),
//!     normalize_url("example.com/path").unwrap(),
//! );
//! ```

use sha2::{Digest, Sha256};
use url::Url;

use crate::error::ValidationError;
use crate::models::Tier;

/// Prepend `https://` unless the input already starts with `http://` or
/// `https://` (in any case).
pub fn with_scheme(input: &str) -> String {
    let trimmed = input.trim();
    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        trimmed
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if has_scheme {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn parse(input: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(&with_scheme(input)).map_err(|_| ValidationError::InvalidUrl)?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(ValidationError::InvalidUrl),
    }
}

/// Returns `true` if the input parses as a URL once a scheme is ensured.
pub fn validate_url(input: &str) -> bool {
    parse(input).is_ok()
}

/// Canonicalize a URL into `https://host/path`, lowercase, without port,
/// trailing slashes, query, or fragment.
///
/// Idempotent: normalizing a canonical URL returns it unchanged.
pub fn normalize_url(input: &str) -> Result<String, ValidationError> {
    let url = parse(input)?;
    let host = url.host_str().ok_or(ValidationError::InvalidUrl)?;
    let canonical = format!("https://{}{}", host, url.path()).to_lowercase();
    Ok(canonical.trim_end_matches('/').to_string())
}

/// Hex-encoded SHA-256 of `"{canonical_url}:{tier}"`.
pub fn generate_fingerprint(canonical_url: &str, tier: Tier) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_url.as_bytes());
    hasher.update(b":");
    hasher.update(tier.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
