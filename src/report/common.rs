//! Cross-host settings optimizer
//!
//! Settings every host shares belong in a common layer, so only what differs
//! is left per host.

use crate::calculate::Params;
use std::collections::BTreeMap;

/// Split per-host settings into a common layer and per-host remainders.
///
/// A setting is common when every host has the same key with a deeply equal
/// value. A key missing from any host is never common. With no hosts there is
/// nothing in common.
pub fn optimize_common(
    hosts: &BTreeMap<String, Params>,
) -> (Params, BTreeMap<String, Params>) {
    let common: Params = match hosts.values().next() {
        Some(first) => first
            .iter()
            .filter(|(key, value)| {
                hosts
                    .values()
                    .all(|params| params.get(key.as_str()) == Some(*value))
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        None => Params::new(),
    };

    let remainders = hosts
        .iter()
        .map(|(host, params)| {
            let remainder: Params = params
                .iter()
                .filter(|(key, _)| !common.contains_key(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            (host.clone(), remainder)
        })
        .collect();

    tracing::debug!("{} setting(s) common to {} host(s)", common.len(), hosts.len());
    (common, remainders)
}
