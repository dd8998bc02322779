use serde::Serialize;

use reportmail::Error;

/// Structured result returned to the invoking platform. The handler
/// always emits one of these, success or error, never a bare panic.
#[derive(Debug, Serialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
}

impl Response {
    pub fn success(object_name: &str, recipient: &str) -> Response {
        Response {
            status: "success",
            message: format!("Email sent successfully for {}", object_name),
            object_name: Some(object_name.to_string()),
            recipient: Some(recipient.to_string()),
            error_type: None,
        }
    }

    pub fn error(err: &Error) -> Response {
        Response {
            status: "error",
            message: format!("Handler execution failed: {}", err),
            object_name: None,
            recipient: None,
            error_type: Some(err.error_type()),
        }
    }

    /// Print the result document to stdout and return the process exit
    /// code for it (the CLI equivalent of a 200/500 response split).
    pub fn emit(&self) -> i32 {
        // Serializing this struct cannot fail
        println!("{}", serde_json::to_string(self).unwrap());

        if self.status == "success" {
            0
        } else {
            1
        }
    }
}
