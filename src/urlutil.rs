//! URL normalization, resolution, and filtering.

use url::Url;

/// Strip a URL's fragment and a single trailing slash (unless that slash
/// immediately follows `://`). Idempotent: applying this twice yields the
/// same result as applying it once.
pub fn normalize_url(url: &str) -> String {
    let without_fragment = match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    };

    let len = without_fragment.len();
    if len > 1 && without_fragment.ends_with('/') {
        if let Some(proto_end) = without_fragment.find("://") {
            // Don't strip the slash that is part of "scheme://".
            if proto_end + 3 == len - 1 {
                return without_fragment.to_string();
            }
        }
        return without_fragment[..len - 1].to_string();
    }

    without_fragment.to_string()
}

/// Resolve `candidate` against `base` per RFC 3986. If `candidate` is
/// already an absolute http(s) URL it is returned unchanged, matching the
/// original crawler's short-circuit (it never re-parses an already
/// absolute link against the base).
pub fn resolve_url(base: &str, candidate: &str) -> Option<String> {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Some(candidate.to_string());
    }

    let base_url = Url::parse(base).ok()?;
    let resolved = base_url.join(candidate).ok()?;
    Some(resolved.to_string())
}

/// True if `url`'s scheme is http or https.
pub fn is_http_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Case-sensitive substring match against the configured skip patterns.
pub fn should_skip(url: &str, skip_patterns: &[String]) -> bool {
    skip_patterns.iter().any(|pattern| url.contains(pattern.as_str()))
}

/// True if `url`'s host matches, or is a subdomain of, one of
/// `allowed_domains`. An empty allow-list means "allow every domain"
/// (Open Question 4's default, matching `ALLOWED_DOMAINS = { NULL }`).
pub fn domain_allowed(url: &str, allowed_domains: &[String]) -> bool {
    if allowed_domains.is_empty() {
        return true;
    }
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    allowed_domains
        .iter()
        .any(|domain| host == domain || host.ends_with(&format!(".{domain}")))
}
