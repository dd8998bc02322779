use serde::Deserialize;

/// Placeholder object name used when the trigger carries no object
/// reference (test/diagnostic mode).
pub const TEST_OBJECT_NAME: &str = "test-report.csv";

/// Trigger payload from the invoking platform. Two shapes are
/// accepted: a storage event with a nested `data.resourceName`, or a
/// direct invocation with a top-level `objectName`.
#[derive(Debug, Default, Deserialize)]
pub struct Trigger {
    data: Option<TriggerData>,
    #[serde(rename = "objectName")]
    object_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TriggerData {
    #[serde(rename = "resourceName")]
    resource_name: Option<String>,
}

impl Trigger {
    /// Lenient parse: a malformed or empty payload is treated as an
    /// empty trigger rather than a failure.
    pub fn parse(payload: &[u8]) -> Trigger {
        match serde_json::from_slice(payload) {
            Ok(trigger) => trigger,
            Err(e) => {
                log::warn!("Failed to parse trigger payload: {}", e);
                Trigger::default()
            }
        }
    }

    /// The event shape wins over the direct shape when both are
    /// present.
    pub fn object_name(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.resource_name.as_deref())
            .or_else(|| self.object_name.as_deref())
    }
}
