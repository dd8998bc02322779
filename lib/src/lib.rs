pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod ledger;
pub mod secrets;
pub mod smtp;
pub mod storage;

pub use error::Error;

/// Deliver one fetched report by email: resolve both SMTP secrets,
/// compose the message, and dispatch it. Shared by the event handler
/// and the poller; locating, fetching, and ledger bookkeeping stay
/// with the entry points.
pub fn send_report(
    settings: &config::Settings,
    auth: &dyn auth::CredentialProvider,
    object_name: &str,
    data: Vec<u8>,
) -> Result<(), Error> {
    log::info!("Retrieving SMTP credentials from vault");
    let secrets = secrets::SecretsClient::new(settings, auth);
    let credentials = smtp::Credentials {
        username: secrets.resolve(&settings.smtp_username_secret_id)?,
        password: secrets.resolve(&settings.smtp_password_secret_id)?,
    };

    let message = email::Message::compose(
        &settings.email_from,
        &settings.email_to,
        object_name,
        data,
    );

    let dispatcher = smtp::Dispatcher::new(&settings.smtp_server, settings.smtp_port);
    dispatcher.send(&credentials, &message)
}
