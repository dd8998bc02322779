use chrono::offset::Utc;
use lettre::SendableEmail;
use lettre_email::Email;

use crate::error::Error;

/// Generic message and attachment types for outbound report mail.
/// Raw bytes are held here; transfer encoding happens when the
/// message is built for dispatch.
#[derive(Debug)]
pub struct Attachment {
    pub name: String,
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Attachment,
}

/// Strip anything from an object name that could break a header
/// value: control characters (CR/LF included) are dropped and double
/// quotes are replaced, since the name lands inside a quoted
/// `filename="..."` parameter.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}

/// Comma-grouped digits for the human-readable size line.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

impl Message {
    /// Build the report email for one object: fixed subject and body
    /// templates interpolating the object name, plus the raw report
    /// bytes as a binary attachment.
    pub fn compose(from: &str, to: &str, object_name: &str, data: Vec<u8>) -> Message {
        let name = sanitize_filename(object_name);

        let subject = format!("Usage Report: {}", name);
        let body = format!(
            "Hello,\n\n\
             Please find attached the latest usage report: {name}\n\n\
             This report was automatically generated and sent by the report \
             automation service.\n\n\
             Report Details:\n\
             - File: {name}\n\
             - Size: {size} bytes\n\
             - Sent: {sent}\n\n\
             Best regards,\n\
             Report Automation",
            name = name,
            size = group_thousands(data.len()),
            sent = Utc::now().format("%Y-%m-%d %H:%M:%S"),
        );

        Message {
            from: from.to_string(),
            to: to.to_string(),
            subject,
            body,
            attachment: Attachment {
                name,
                data,
                content_type: "application/octet-stream".to_string(),
            },
        }
    }

    /// Render into a sendable MIME message: multipart with a plain-text
    /// part and a base64-encoded attachment part carrying a
    /// `Content-Disposition: attachment; filename="..."` header.
    pub fn build(&self) -> Result<SendableEmail, Error> {
        let content_type = self
            .attachment
            .content_type
            .parse::<mime::Mime>()
            .map_err(|_| {
                Error::Dispatch(format!(
                    "invalid attachment content type: {}",
                    self.attachment.content_type
                ))
            })?;

        let email = Email::builder()
            .from(self.from.as_str())
            .to(self.to.as_str())
            .subject(self.subject.as_str())
            .text(self.body.as_str())
            .attachment(&self.attachment.data, &self.attachment.name, &content_type)?
            .build()?;

        Ok(email.into())
    }
}
