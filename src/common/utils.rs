//! Utility functions for rxline

use std::hash::{Hash, Hasher};

/// Normalize a user-supplied endpoint into a URI tonic accepts.
/// Bare `host:port` gets an `http://` scheme prepended.
pub fn normalize_endpoint(endpoint: &str) -> crate::Result<String> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(crate::Error::InvalidEndpoint("empty endpoint".into()));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else if trimmed.contains("://") {
        Err(crate::Error::InvalidEndpoint(format!(
            "unsupported scheme in {trimmed}"
        )))
    } else {
        Ok(format!("http://{trimmed}"))
    }
}

/// Derive a provisional member id from an endpoint address. Used to seed the
/// registry before the first membership fetch replaces it with server-assigned
/// ids; only needs to be unique within one process.
pub fn seed_member_id(addr: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    addr.hash(&mut hasher);
    hasher.finish()
}

/// Parse duration string (e.g., "500ms", "30s", "5m")
pub fn parse_duration(s: &str) -> crate::Result<std::time::Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(crate::Error::InvalidConfig("empty duration".into()));
    }

    let (num_str, unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, "ms")
    } else if let Some(n) = s.strip_suffix('s') {
        (n, "s")
    } else if let Some(n) = s.strip_suffix('m') {
        (n, "m")
    } else {
        (s, "ms")
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| crate::Error::InvalidConfig(format!("invalid duration: {s}")))?;

    let millis = match unit {
        "ms" => num,
        "s" => num * 1_000,
        "m" => num * 60_000,
        _ => unreachable!(),
    };
    Ok(std::time::Duration::from_millis(millis))
}
