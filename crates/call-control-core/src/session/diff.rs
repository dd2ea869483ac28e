//! Party-level diffing of held state against incoming snapshots
//!
//! Field comparison is deliberately shallow. A scalar field differs when its
//! value differs. An object or array field is compared one level deep: both
//! sides must have the same keys (indices for arrays) holding equal scalar
//! values. Values nested below that level are never considered equal, so a
//! field holding nested objects (for example a non-empty `recordings` list)
//! is reported as changed every time it is present in an update. Event
//! granularity downstream depends on this; do not turn it into a deep diff.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::CallControlResult;
use crate::party::Party;

/// Outcome of comparing one incoming party with held state
#[derive(Debug, Clone, PartialEq)]
pub enum PartyDiff {
    /// Party id not held yet
    New(Party),
    /// Held party with at least one differing field
    Update {
        party: Party,
        /// Wire keys of the fields that differ
        changed: Vec<String>,
    },
}

pub(crate) fn party_fields(party: &Party) -> Map<String, Value> {
    match serde_json::to_value(party) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Equality of values nested inside a field; composites never match
fn nested_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => !is_composite(a) && !is_composite(b) && a == b,
        (None, None) => true,
        _ => false,
    }
}

/// Two-way key scan over one level of an object or array
pub fn shallow_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            b.iter().all(|(key, value)| nested_equal(a.get(key), Some(value)))
                && a.iter().all(|(key, value)| nested_equal(Some(value), b.get(key)))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| nested_equal(Some(x), Some(y)))
        }
        _ => false,
    }
}

fn field_equal(held: Option<&Value>, incoming: &Value) -> bool {
    match held {
        None => false,
        Some(held) if is_composite(incoming) => shallow_equal(incoming, held),
        Some(held) => held == incoming,
    }
}

/// Keys present in `incoming` whose values differ from `held`
pub fn diff_fields(held: &Map<String, Value>, incoming: &Map<String, Value>) -> Vec<String> {
    incoming
        .iter()
        .filter(|(key, value)| !field_equal(held.get(key.as_str()), value))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Compare incoming parties with held ones, matched by id
///
/// Held parties missing from `incoming` are left alone. Unchanged parties
/// produce no diff.
pub fn diff_parties(held: &[Party], incoming: &[Party]) -> Vec<PartyDiff> {
    let mut diffs = Vec::new();
    let mut new_ids = HashSet::new();

    for party in incoming {
        match held.iter().find(|p| p.id == party.id) {
            None => {
                if new_ids.insert(party.id.clone()) {
                    diffs.push(PartyDiff::New(party.clone()));
                } else {
                    warn!(party_id = %party.id, "Ignoring duplicate party id in update");
                }
            }
            Some(existing) => {
                let changed = diff_fields(&party_fields(existing), &party_fields(party));
                if !changed.is_empty() {
                    diffs.push(PartyDiff::Update { party: party.clone(), changed });
                }
            }
        }
    }
    diffs
}

/// Shallow-overwrite `held` with every field present in `incoming`
pub fn merge_party(held: &Party, incoming: &Party) -> CallControlResult<Party> {
    let mut fields = party_fields(held);
    fields.extend(party_fields(incoming));
    Ok(serde_json::from_value(Value::Object(fields))?)
}
