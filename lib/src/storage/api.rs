use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::Error;

// Request timeout, in seconds
pub(crate) const STORAGE_REQUEST_TIMEOUT: u64 = 30;

// Fields requested from the listing endpoint
pub(crate) const LIST_FIELDS: &str = "name,timeCreated,size";

/// Identity of a single stored object, as returned by the listing
/// endpoint. Immutable once listed; sourced fresh on every locate call.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    pub name: String,
    pub time_created: DateTime<Utc>,
    pub size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ListObjectsResult {
    pub objects: Vec<ObjectSummary>,
}

/// Map gateway HTTP errors to the library error taxonomy.
pub fn map_status(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, Error> {
    let err = resp.error_for_status_ref();

    if let Err(e) = err {
        let status = e.status().unwrap();
        let msg = e.to_string();

        match status {
            StatusCode::NOT_FOUND => Err(Error::ObjectNotFound(msg)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication(msg)),
            _ => Err(Error::Transport(msg)),
        }
    } else {
        Ok(resp)
    }
}

/// Select the most recently created object whose name ends with
/// `suffix`. Creation-time ties are broken by lexicographically
/// greatest name, so the result is deterministic regardless of
/// listing order.
pub fn latest_matching(objects: Vec<ObjectSummary>, suffix: &str) -> Option<ObjectSummary> {
    objects
        .into_iter()
        .filter(|obj| obj.name.ends_with(suffix))
        .max_by(|a, b| {
            a.time_created
                .cmp(&b.time_created)
                .then_with(|| a.name.cmp(&b.name))
        })
}
