//! Hostname normalization and allowlist matching.

use url::Url;

use crate::types::Domain;

/// Normalizes a bare domain or URL into a lowercase hostname without `www.`.
///
/// Input without a scheme is treated as a bare domain. Returns `None` when no
/// hostname can be extracted.
pub fn normalize_domain(input: &str) -> Option<String> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Finds the allowlist entry a URL belongs to.
///
/// A hostname belongs to an entry when it equals the entry or is one of its
/// subdomains (`sub.example.com` belongs to `example.com`, but
/// `example.com.evil.com` does not). Exact matches win over subdomain matches.
pub fn match_allowed<'a, I>(url: &str, allowlist: I) -> Option<&'a Domain>
where
    I: IntoIterator<Item = &'a Domain>,
{
    let host = normalize_domain(url)?;
    let mut subdomain_match = None;

    for entry in allowlist {
        if host == entry.as_str() {
            return Some(entry);
        }
        if subdomain_match.is_none() && is_subdomain_of(&host, entry.as_str()) {
            subdomain_match = Some(entry);
        }
    }

    subdomain_match
}

fn is_subdomain_of(host: &str, parent: &str) -> bool {
    host.strip_suffix(parent)
        .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
}
