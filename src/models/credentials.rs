//! Where delete requests carry their edit key.
//!
//! Deletes accept the key as a `key` query parameter, or in a JSON body as
//! `key` or `editKey`, checked in that order. Empty strings count as absent.

use serde::Deserialize;

/// Query parameters accepted by the delete endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyBody {
    key: Option<String>,
    edit_key: Option<String>,
}

/// Pick the edit key from the query string or, failing that, the raw body.
///
/// A missing or unparseable body is not an error here: the gate reports
/// `KeyRequired` if nothing usable was found.
pub fn supplied_key(query: KeyQuery, body: &[u8]) -> Option<String> {
    if let Some(key) = non_empty(query.key) {
        return Some(key);
    }

    let body: KeyBody = serde_json::from_slice(body).ok()?;
    non_empty(body.key).or_else(|| non_empty(body.edit_key))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
