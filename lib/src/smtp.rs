use std::time::Duration;

use lettre::smtp::authentication::Credentials as SmtpCredentials;
use lettre::smtp::client::net::ClientTlsParameters;
use lettre::smtp::ClientSecurity;
use lettre::{SmtpClient, Transport};
use native_tls::TlsConnector;

use crate::email::Message;
use crate::error::Error;

// Session timeout, in seconds
const SMTP_TIMEOUT: u64 = 30;

/// Resolved SMTP credentials. Held in memory for the duration of one
/// send operation only. No `Debug` impl so the password cannot leak
/// into logs.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One-shot SMTP dispatcher: connect, upgrade to TLS, authenticate,
/// transmit, close. Any step's failure aborts the rest; there is no
/// retry within a run.
pub struct Dispatcher {
    server: String,
    port: u16,
}

impl Dispatcher {
    pub fn new(server: &str, port: u16) -> Self {
        Self {
            server: server.to_string(),
            port,
        }
    }

    pub fn send(&self, credentials: &Credentials, message: &Message) -> Result<(), Error> {
        let email = message.build()?;

        log::info!(
            "Connecting to SMTP server {}:{}",
            self.server,
            self.port
        );

        let tls = TlsConnector::new()?;
        let params = ClientTlsParameters::new(self.server.clone(), tls);

        let mut mailer = SmtpClient::new(
            (self.server.as_str(), self.port),
            ClientSecurity::Required(params),
        )?
        .credentials(SmtpCredentials::new(
            credentials.username.clone(),
            credentials.password.clone(),
        ))
        .timeout(Some(Duration::from_secs(SMTP_TIMEOUT)))
        .transport();

        let result = mailer.send(email);
        mailer.close();
        result?;

        log::info!("Email sent to {}", message.to);
        Ok(())
    }
}
