//! Decoding and encoding of collection documents.
//!
//! Every backend funnels raw text through [`decode_state`], so damaged documents are
//! handled the same way no matter where they were stored:
//!
//! | Document                                  | Result                               |
//! |-------------------------------------------|--------------------------------------|
//! | absent                                    | empty collection, `next_id = 1`      |
//! | not JSON, or not a JSON object            | empty collection, `next_id = 1`      |
//! | record list missing or not an array       | empty collection, `next_id = 1`      |
//! | `next_id` missing or not a positive int   | records kept, `next_id = max(id)+1`  |
//! | a single record that does not decode      | kept verbatim, hidden from callers   |
//!
//! A record that does not decode is carried in [`CollectionState::unreadable`] with its
//! position and written back unchanged by [`encode_state`], so a later save never
//! erases it. Its id still counts when the counter is recomputed, so the id is never
//! handed out again.

use super::{CollectionState, Record};
use crate::error::Result;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

pub const NEXT_ID_KEY: &str = "next_id";

pub fn decode_state<R: Record>(raw: Option<&str>) -> CollectionState<R> {
    let collection = R::COLLECTION;
    let Some(raw) = raw else {
        debug!(%collection, "no stored document, starting empty");
        return CollectionState::default();
    };

    let document: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            error!(%collection, error = %e, "failed to parse stored document, resetting to defaults");
            return CollectionState::default();
        }
    };

    let Value::Object(mut map) = document else {
        warn!(%collection, "stored document is not an object, resetting to defaults");
        return CollectionState::default();
    };

    let raw_records = match map.remove(collection.key()) {
        Some(Value::Array(items)) => items,
        _ => {
            warn!(%collection, "missing or invalid record list, resetting to defaults");
            return CollectionState::default();
        }
    };

    let mut max_raw_id = 0;
    let mut records = Vec::with_capacity(raw_records.len());
    let mut unreadable = Vec::new();
    for (position, item) in raw_records.into_iter().enumerate() {
        if let Some(id) = item.get("id").and_then(Value::as_u64) {
            max_raw_id = max_raw_id.max(id);
        }
        match R::deserialize(&item) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(%collection, position, error = %e, "keeping undecodable record as is");
                unreadable.push((position, item));
            }
        }
    }

    let next_id = match map.get(NEXT_ID_KEY).and_then(Value::as_u64) {
        Some(n) if n > 0 => n,
        _ => {
            let recomputed = max_raw_id + 1;
            warn!(%collection, next_id = recomputed, "missing or invalid next_id, recalculating");
            recomputed
        }
    };

    CollectionState {
        records,
        next_id,
        unreadable,
    }
}

pub fn encode_state<R: Record>(state: &CollectionState<R>) -> Result<String> {
    let mut items = state
        .records
        .iter()
        .map(serde_json::to_value)
        .collect::<serde_json::Result<Vec<_>>>()?;
    // Positions ascend, so each insert lands where the record was read from.
    for (position, raw) in &state.unreadable {
        items.insert((*position).min(items.len()), raw.clone());
    }

    let mut map = Map::new();
    map.insert(R::COLLECTION.key().to_string(), Value::Array(items));
    map.insert(NEXT_ID_KEY.to_string(), Value::from(state.next_id));
    Ok(serde_json::to_string_pretty(&Value::Object(map))?)
}
