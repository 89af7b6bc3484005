//! Client identity derivation.
//!
//! Anonymous clients are fingerprinted from their network origin and user
//! agent. Two browsers behind the same NAT with the same user agent collapse
//! into one identity; that is accepted.

const MAX_IDENTITY_LEN: usize = 256;
const UNKNOWN: &str = "unknown";

/// Pick the client origin from proxy headers: the first `x-forwarded-for`
/// hop, then `x-real-ip`.
pub fn client_origin(forwarded_for: Option<&str>, real_ip: Option<&str>) -> Option<String> {
    forwarded_for
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| real_ip.map(str::trim).filter(|v| !v.is_empty()))
        .map(str::to_string)
}

/// Build a stable identifier from origin and user agent.
///
/// Only `[A-Za-z0-9-]` survives and the result is capped at 256 characters,
/// so the id is safe to use as a map key and in log lines.
pub fn derive_client_id(origin: Option<&str>, agent: Option<&str>) -> String {
    let origin = origin.filter(|v| !v.is_empty()).unwrap_or(UNKNOWN);
    let agent = agent.filter(|v| !v.is_empty()).unwrap_or(UNKNOWN);

    format!("{origin}-{agent}")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(MAX_IDENTITY_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_prefers_first_forwarded_hop() {
        assert_eq!(
            client_origin(Some("203.0.113.7, 10.0.0.1"), Some("10.0.0.2")).as_deref(),
            Some("203.0.113.7")
        );
        assert_eq!(
            client_origin(None, Some(" 10.0.0.2 ")).as_deref(),
            Some("10.0.0.2")
        );
        assert_eq!(client_origin(Some(""), None), None);
    }

    #[test]
    fn test_derive_strips_unsafe_characters() {
        let id = derive_client_id(Some("203.0.113.7"), Some("Mozilla/5.0 (X11; Linux)"));
        assert_eq!(id, "20301137-Mozilla50X11Linux");
    }

    #[test]
    fn test_derive_defaults_missing_parts() {
        assert_eq!(derive_client_id(None, None), "unknown-unknown");
        assert_eq!(derive_client_id(Some("::1"), None), "1-unknown");
    }

    #[test]
    fn test_derive_truncates() {
        let agent = "a".repeat(1_000);
        let id = derive_client_id(Some("1.2.3.4"), Some(&agent));
        assert_eq!(id.len(), 256);
        assert!(id.starts_with("1234-"));
    }
}
