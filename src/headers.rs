//! Header composition and send-time filtering.
//!
//! Headers flow through two stages. Composition merges caller overrides over
//! defaults (override wins on key collision) while preserving suppression
//! markers. Filtering runs at send time: entries with a `None` value are
//! dropped, and `Accept` is dropped when the target url already encodes an
//! `accept=` parameter.

use std::collections::HashMap;

/// Header name to value mapping. A `None` value marks the header as
/// suppressed: composition carries it through so an override can cancel a
/// default, and filtering drops it before transmission.
pub type HeaderOverrides = HashMap<String, Option<String>>;

/// Merge `overrides` over `defaults`. Override wins on key collision.
///
/// Pure and deterministic: the same inputs always produce the same mapping.
pub fn compose(defaults: &HeaderOverrides, overrides: &HeaderOverrides) -> HeaderOverrides {
    let mut merged = defaults.clone();
    for (name, value) in overrides {
        merged.insert(name.clone(), value.clone());
    }
    merged
}

/// Produce the header pairs actually transmitted for `url`.
///
/// Drops suppressed (`None`-valued) entries, drops `Accept` when the url
/// already carries an `accept=` fragment, and sorts by name so the
/// transmitted set is stable across runs.
pub fn filter_for_send(url: &str, headers: &HeaderOverrides) -> Vec<(String, String)> {
    let url_has_accept = url.contains("accept=");
    let mut sent: Vec<(String, String)> = headers
        .iter()
        .filter_map(|(name, value)| {
            let value = value.as_ref()?;
            if url_has_accept && name.eq_ignore_ascii_case("accept") {
                return None;
            }
            Some((name.clone(), value.clone()))
        })
        .collect();
    sent.sort();
    sent
}
