use std::fs;
use std::io::Read;
use std::path::PathBuf;

use structopt::StructOpt;

use reportmail::config::Settings;
use reportmail::{auth, storage, Error};

mod response;
mod trigger;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "reportmail-handler",
    about = "Event-triggered delivery of a stored cost report by email."
)]
struct Opt {
    /// Read the trigger payload from a file instead of stdin
    #[structopt(short, long)]
    payload: Option<PathBuf>,
}

fn read_payload(opt: &Opt) -> Vec<u8> {
    let result = match opt.payload {
        Some(ref path) => fs::read(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf).map(|_| buf)
        }
    };

    match result {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Failed to read trigger payload: {}", e);
            Vec::new()
        }
    }
}

/// Fetch the object and hand it to the shared delivery sequence.
/// Returns the recipient for the success document.
fn run(object_name: &str) -> Result<String, Error> {
    let settings = Settings::from_env()?;
    let provider = auth::from_environment()?;

    let client = storage::Client::new(&settings, provider.as_ref());
    let data = client.fetch(object_name)?;

    reportmail::send_report(&settings, provider.as_ref(), object_name, data)?;

    Ok(settings.email_to)
}

fn main() {
    // Init logger
    env_logger::builder().format_timestamp_micros().init();

    let opt = Opt::from_args();
    let payload = read_payload(&opt);

    let trigger = trigger::Trigger::parse(&payload);
    let object_name = match trigger.object_name() {
        Some(name) => name.to_string(),
        None => {
            log::warn!("No object name found in payload, using test mode");
            trigger::TEST_OBJECT_NAME.to_string()
        }
    };

    log::info!("Processing object: {}", object_name);

    let response = match run(&object_name) {
        Ok(recipient) => response::Response::success(&object_name, &recipient),
        Err(e) => {
            log::error!("Handler execution failed: {}", e);
            response::Response::error(&e)
        }
    };

    std::process::exit(response.emit());
}
