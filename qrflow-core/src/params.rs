//! Parameter Resolver
//!
//! Navigation can drop query parameters across some client-side
//! transitions, so a value may arrive either in the request's query string
//! (primary channel) or in the query segment embedded in the routing fragment
//! (`#/scan?qr=...`, secondary channel). The primary channel always wins.
//!
//! Both channels are passed in explicitly; nothing here reads ambient
//! location state.

use std::collections::BTreeMap;

/// Delimiter that starts the query segment inside a routing fragment.
pub const FRAGMENT_QUERY_DELIMITER: char = '?';

/// Requested name -> resolved value. Absence is an expected outcome.
pub type ResolvedParams = BTreeMap<String, Option<String>>;

/// Resolve each requested name against the primary channel, then the fragment.
///
/// Empty values count as absent, so `?qr=` in the primary channel does not
/// mask `qr` in the fragment.
pub fn resolve_params(primary: &str, fragment: Option<&str>, names: &[&str]) -> ResolvedParams {
    let primary_pairs = parse_query(primary.strip_prefix('?').unwrap_or(primary));
    let fragment_pairs = fragment
        .and_then(fragment_query)
        .map(parse_query)
        .unwrap_or_default();

    names
        .iter()
        .map(|name| {
            let value = lookup(&primary_pairs, name).or_else(|| lookup(&fragment_pairs, name));
            (name.to_string(), value)
        })
        .collect()
}

/// Query segment of a routing fragment: everything after its own `?`.
fn fragment_query(fragment: &str) -> Option<&str> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    fragment
        .split_once(FRAGMENT_QUERY_DELIMITER)
        .map(|(_, query)| query)
}

fn lookup(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.clone())
}

/// Split an `application/x-www-form-urlencoded` query into decoded pairs.
fn parse_query(raw: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
