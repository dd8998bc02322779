use std::path::PathBuf;

use structopt::StructOpt;

use reportmail::config::Settings;
use reportmail::ledger::{fingerprint, Ledger};
use reportmail::{auth, storage, Error};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "reportmail-poller",
    about = "Polls the report bucket and emails the latest unsent report."
)]
struct Opt {
    /// Key=value configuration file
    #[structopt(short, long, default_value = "config.env")]
    config: PathBuf,

    /// Sent-ledger file
    #[structopt(short, long, default_value = "sent_files.json")]
    ledger: PathBuf,
}

/// One poll: locate the latest report, skip it if the ledger already
/// has its fingerprint, otherwise fetch, send, and record it.
fn run(opt: &Opt) -> Result<(), Error> {
    let config_path = opt
        .config
        .to_str()
        .ok_or_else(|| Error::Configuration("config path is not valid UTF-8".to_string()))?;
    let settings = Settings::from_file(config_path)?;
    let provider = auth::from_environment()?;

    let client = storage::Client::new(&settings, provider.as_ref());

    let latest = match client.find_latest(&settings.report_prefix, &settings.report_suffix)? {
        Some(obj) => obj,
        None => {
            log::info!("No report files found. Nothing to send.");
            return Ok(());
        }
    };

    let fp = fingerprint(&latest.name, &latest.time_created);
    let mut sent_ledger = Ledger::load(&opt.ledger);

    if sent_ledger.is_sent(&fp) {
        log::info!("File {} was already sent. Skipping.", latest.name);
        return Ok(());
    }

    let data = client.fetch(&latest.name)?;
    reportmail::send_report(&settings, provider.as_ref(), &latest.name, data)?;

    // Recorded only after a successful dispatch
    sent_ledger.mark_sent(&fp, &latest.name, &latest.time_created)?;

    log::info!("Successfully sent report: {}", latest.name);
    Ok(())
}

fn main() {
    // Init logger
    env_logger::builder().format_timestamp_micros().init();

    let opt = Opt::from_args();

    if let Err(e) = run(&opt) {
        log::error!("Failed to send report: {}", e);
        std::process::exit(1);
    }
}
