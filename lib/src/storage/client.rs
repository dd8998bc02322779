use std::time::Duration;

use super::api;
use super::api::{ListObjectsResult, ObjectSummary};

use crate::auth::CredentialProvider;
use crate::config::Settings;
use crate::error::Error;

/// Blocking client for the object-storage gateway. Listing and
/// download only; this system never writes to the bucket.
pub struct Client<'a> {
    http: reqwest::blocking::Client,
    endpoint: String,
    namespace: String,
    bucket: String,
    auth: &'a dyn CredentialProvider,
}

impl<'a> Client<'a> {
    pub fn new(settings: &Settings, auth: &'a dyn CredentialProvider) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(api::STORAGE_REQUEST_TIMEOUT))
            .build()
            .unwrap();

        Self {
            http,
            endpoint: settings.object_storage_endpoint.clone(),
            namespace: settings.namespace.clone(),
            bucket: settings.bucket.clone(),
            auth,
        }
    }

    /// Base URL for object operations: `{endpoint}/n/{ns}/b/{bucket}/o`
    fn object_root(&self) -> Result<reqwest::Url, Error> {
        let mut url = reqwest::Url::parse(&self.endpoint)?;

        url.path_segments_mut()
            .map_err(|_| Error::Transport(format!("endpoint cannot be a base: {}", self.endpoint)))?
            .extend(&["n", &self.namespace, "b", &self.bucket, "o"]);

        Ok(url)
    }

    /// List all objects under `prefix`, with name, creation time, and
    /// size. No pagination: report buckets hold a few dozen objects.
    pub fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, Error> {
        let mut url = self.object_root()?;
        url.query_pairs_mut()
            .append_pair("prefix", prefix)
            .append_pair("fields", api::LIST_FIELDS);

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.auth.bearer_token()?)
            .send()?;

        let resp = api::map_status(resp)?;
        let result: ListObjectsResult = resp.json()?;

        Ok(result.objects)
    }

    /// Locate the most recently created object matching the prefix and
    /// suffix filters. `Ok(None)` means the listing succeeded but
    /// nothing matched; that is "nothing to do", not a failure.
    pub fn find_latest(
        &self,
        prefix: &str,
        suffix: &str,
    ) -> Result<Option<ObjectSummary>, Error> {
        log::info!(
            "Listing objects in bucket '{}' with prefix '{}'",
            self.bucket,
            prefix
        );

        let objects = self.list_objects(prefix)?;
        let latest = api::latest_matching(objects, suffix);

        match latest {
            Some(ref obj) => log::info!(
                "Latest report file: {} (created: {}, size: {} bytes)",
                obj.name,
                obj.time_created,
                obj.size.unwrap_or(0)
            ),
            None => log::warn!(
                "No files matching '{}*{}' found in bucket '{}'",
                prefix,
                suffix,
                self.bucket
            ),
        }

        Ok(latest)
    }

    /// Download the raw content of a single object.
    pub fn fetch(&self, name: &str) -> Result<Vec<u8>, Error> {
        log::info!("Fetching object '{}' from bucket '{}'", name, self.bucket);

        let mut url = self.object_root()?;
        url.path_segments_mut()
            .map_err(|_| Error::Transport(format!("endpoint cannot be a base: {}", self.endpoint)))?
            .push(name);

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.auth.bearer_token()?)
            .send()?;

        let resp = api::map_status(resp)?;
        let data = resp.bytes()?.to_vec();

        log::info!("Object '{}' fetched, size: {} bytes", name, data.len());
        Ok(data)
    }
}
