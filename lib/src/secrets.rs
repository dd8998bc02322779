use std::time::Duration;

use serde::Deserialize;

use crate::auth::CredentialProvider;
use crate::config::Settings;
use crate::error::Error;

// Request timeout, in seconds
const VAULT_REQUEST_TIMEOUT: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretBundle {
    secret_bundle_content: SecretBundleContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretBundleContent {
    content: String,
}

/// Blocking client for the vault gateway. Every `resolve` call
/// performs a fresh fetch and decode; nothing is cached, and the
/// decoded value is never logged.
pub struct SecretsClient<'a> {
    http: reqwest::blocking::Client,
    endpoint: String,
    auth: &'a dyn CredentialProvider,
}

impl<'a> SecretsClient<'a> {
    pub fn new(settings: &Settings, auth: &'a dyn CredentialProvider) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(VAULT_REQUEST_TIMEOUT))
            .build()
            .unwrap();

        Self {
            http,
            endpoint: settings.vault_endpoint.clone(),
            auth,
        }
    }

    /// Fetch and decode the plaintext value of a secret.
    pub fn resolve(&self, secret_id: &str) -> Result<String, Error> {
        log::info!("Fetching secret {}", secret_id);

        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| Error::SecretUnavailable(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| Error::SecretUnavailable(format!("bad vault endpoint: {}", self.endpoint)))?
            .extend(&["secretbundles", secret_id]);

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.auth.bearer_token()?)
            .send()?;

        if !resp.status().is_success() {
            return Err(Error::SecretUnavailable(format!(
                "secret store returned {} for {}",
                resp.status(),
                secret_id
            )));
        }

        let bundle: SecretBundle = resp
            .json()
            .map_err(|e| Error::SecretUnavailable(e.to_string()))?;

        let value = decode_content(&bundle.secret_bundle_content.content)?;
        log::info!("Secret {} retrieved successfully", secret_id);

        Ok(value)
    }
}

/// Secret bundle content arrives base64-encoded; the plaintext must be
/// valid UTF-8.
fn decode_content(content: &str) -> Result<String, Error> {
    let raw = base64::decode(content)
        .map_err(|e| Error::SecretUnavailable(format!("invalid base64 content: {}", e)))?;

    String::from_utf8(raw)
        .map_err(|_| Error::SecretUnavailable("secret is not valid UTF-8".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_bundle_content() {
        let encoded = base64::encode("smtp-user@example.com");
        assert_eq!(decode_content(&encoded).unwrap(), "smtp-user@example.com");
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        match decode_content("not!!base64??") {
            Err(Error::SecretUnavailable(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_non_utf8_plaintext() {
        let encoded = base64::encode(&[0xff, 0xfe, 0x00, 0x80][..]);
        match decode_content(&encoded) {
            Err(Error::SecretUnavailable(ref msg)) => assert!(msg.contains("UTF-8")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bundle_deserializes_gateway_payload() {
        let payload = r#"{
            "secretBundleContent": {
                "contentType": "BASE64",
                "content": "c2VjcmV0"
            },
            "versionNumber": 3
        }"#;

        let bundle: SecretBundle = serde_json::from_str(payload).unwrap();
        assert_eq!(decode_content(&bundle.secret_bundle_content.content).unwrap(), "secret");
    }
}
