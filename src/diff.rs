//! Change detection between the surface's element list and the
//! replicated list.
//!
//! The surface hands over its full ordered element list after every
//! change; this module mutates the replicated list in place until it
//! matches, and reports whether anything actually changed. The caller
//! commits only on `true`, so unchanged snapshots never produce empty
//! history entries or broadcasts.

use loro::{LoroList, LoroMap, LoroResult, LoroValue, ValueOrContainer};

use crate::document::element_map_at;
use crate::element::{Element, VERSION_KEY};

/// Mirror `observed` into `list`, returning whether `list` was mutated.
///
/// Deleted elements are dropped before diffing; they are never
/// materialized in the replicated list. Per element, the stored
/// `version` is a cheap short-circuit: equal versions are assumed
/// identical, which holds as long as the surface bumps `version` on
/// every payload mutation.
pub fn sync_observed(list: &LoroList, observed: &[Element]) -> LoroResult<bool> {
    let observed: Vec<&Element> = observed.iter().filter(|e| !e.deleted).collect();
    let mut changed = false;

    // Grow: append empty map containers for every new trailing index.
    for index in list.len()..observed.len() {
        list.insert_container(index, LoroMap::new())?;
        changed = true;
    }

    // Shrink: drop the trailing excess.
    if observed.len() < list.len() {
        list.delete(observed.len(), list.len() - observed.len())?;
        changed = true;
    }

    for (index, element) in observed.iter().enumerate() {
        let Some(map) = element_map_at(list, index) else {
            break;
        };

        if stored_version(&map) == Some(element.version) {
            continue;
        }

        for (key, value) in element.fields() {
            let up_to_date = match map.get(key) {
                Some(ValueOrContainer::Value(stored)) => value.matches_loro(&stored),
                _ => false,
            };
            if !up_to_date {
                map.insert(key, value.to_loro())?;
                changed = true;
            }
        }
    }

    Ok(changed)
}

fn stored_version(map: &LoroMap) -> Option<i64> {
    match map.get(VERSION_KEY) {
        Some(ValueOrContainer::Value(LoroValue::I64(version))) => Some(version),
        _ => None,
    }
}
