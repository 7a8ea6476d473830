//! Gateway resolution for `ipfs://` metadata URIs.

/// Rewrite an `ipfs://` URI into a URL on `gateway`.
///
/// Accepts `ipfs://<cid>/<path>` and `ipfs://ipfs/<cid>/<path>`. `http(s)://` and `data:`
/// URLs, and anything unrecognised, pass through unchanged. Empty input yields `None`.
pub fn resolve_ipfs_url(url: &str, gateway: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("data:") {
        return Some(url.to_string());
    }

    let Some(rest) = url.strip_prefix("ipfs://") else {
        return Some(url.to_string());
    };
    let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
    let (cid, path) = match rest.split_once('/') {
        Some((cid, path)) => (cid, path),
        None => (rest, ""),
    };

    if path.is_empty() {
        Some(format!("{gateway}{cid}"))
    } else {
        Some(format!("{gateway}{cid}/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_IPFS_GATEWAY;

    #[test]
    fn resolves_cid_with_path() {
        assert_eq!(
            resolve_ipfs_url("ipfs://bafycid/0.json", DEFAULT_IPFS_GATEWAY).as_deref(),
            Some("https://ipfs.io/ipfs/bafycid/0.json")
        );
    }

    #[test]
    fn strips_redundant_ipfs_segment() {
        assert_eq!(
            resolve_ipfs_url("ipfs://ipfs/bafycid/a/b.png", "https://gw/").as_deref(),
            Some("https://gw/bafycid/a/b.png")
        );
    }

    #[test]
    fn bare_cid() {
        assert_eq!(
            resolve_ipfs_url("ipfs://bafycid", "https://gw/").as_deref(),
            Some("https://gw/bafycid")
        );
    }

    #[test]
    fn passthrough_and_empty() {
        assert_eq!(resolve_ipfs_url("", "https://gw/"), None);
        for url in ["https://x.io/1.json", "http://x.io", "data:application/json,{}", "ar://tx"] {
            assert_eq!(resolve_ipfs_url(url, "https://gw/").as_deref(), Some(url));
        }
    }
}
