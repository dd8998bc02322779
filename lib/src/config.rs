use std::collections::HashMap;
use std::env;

use crate::error::Error;

pub const DEFAULT_SMTP_SERVER: &str = "localhost";
pub const DEFAULT_SMTP_PORT: &str = "587";
pub const DEFAULT_REPORT_PREFIX: &str = "WeeklyCostsScheduledReport_";
pub const DEFAULT_REPORT_SUFFIX: &str = ".csv.gz";

/// All settings for one run, resolved once at startup and passed by
/// reference from there on. No component reads the process environment
/// directly.
#[derive(Clone, Debug)]
pub struct Settings {
    pub namespace: String,
    pub bucket: String,
    pub object_storage_endpoint: String,
    pub vault_endpoint: String,
    pub email_from: String,
    pub email_to: String,
    pub smtp_username_secret_id: String,
    pub smtp_password_secret_id: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub report_prefix: String,
    pub report_suffix: String,
}

/// Key lookup with missing-key accounting, so that startup can report
/// every missing key in a single error instead of one per run.
struct Source<F: Fn(&str) -> Option<String>> {
    lookup: F,
    missing: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> Source<F> {
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    fn required(&mut self, key: &str) -> String {
        match (self.lookup)(key) {
            Some(ref v) if !v.is_empty() => v.clone(),
            _ => {
                self.missing.push(key.to_string());
                String::new()
            }
        }
    }

    fn optional(&self, key: &str, default: &str) -> String {
        match (self.lookup)(key) {
            Some(ref v) if !v.is_empty() => v.clone(),
            _ => default.to_string(),
        }
    }
}

impl Settings {
    /// Event-handler path: settings come from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        let settings = Self::from_lookup(
            |key| env::var(key).ok(),
            "BUCKET_NAME",
            "EMAIL_FROM",
            "EMAIL_TO",
            false,
        )?;
        settings.log();
        Ok(settings)
    }

    /// Polling path: settings come from a key=value file. The file-key
    /// spelling differs from the environment spelling for the bucket and
    /// address keys.
    pub fn from_file(path: &str) -> Result<Self, Error> {
        let mut cfg = config::Config::default();
        cfg.merge(config::File::new(path, config::FileFormat::Ini))
            .map_err(|e| Error::Configuration(format!("{}: {}", path, e)))?;

        let map = cfg
            .try_into::<HashMap<String, String>>()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        // The config crate normalizes keys to lowercase.
        let settings = Self::from_lookup(
            |key| map.get(&key.to_lowercase()).cloned(),
            "REPORT_BUCKET_NAME",
            "EMAIL_SENDER",
            "EMAIL_RECIPIENT",
            true,
        )?;
        settings.log();
        Ok(settings)
    }

    /// `smtp_mandatory` distinguishes the two sources: the config file
    /// must spell out the SMTP endpoint, while the environment path
    /// falls back to defaults.
    fn from_lookup<F>(
        lookup: F,
        bucket_key: &str,
        from_key: &str,
        to_key: &str,
        smtp_mandatory: bool,
    ) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut src = Source::new(lookup);

        let smtp_server = if smtp_mandatory {
            src.required("SMTP_SERVER")
        } else {
            src.optional("SMTP_SERVER", DEFAULT_SMTP_SERVER)
        };
        let port = if smtp_mandatory {
            src.required("SMTP_PORT")
        } else {
            src.optional("SMTP_PORT", DEFAULT_SMTP_PORT)
        };

        let settings = Self {
            namespace: src.required("NAMESPACE"),
            bucket: src.required(bucket_key),
            object_storage_endpoint: src.required("OBJECT_STORAGE_ENDPOINT"),
            vault_endpoint: src.required("VAULT_ENDPOINT"),
            email_from: src.required(from_key),
            email_to: src.required(to_key),
            smtp_username_secret_id: src.required("SMTP_USERNAME_SECRET_ID"),
            smtp_password_secret_id: src.required("SMTP_PASSWORD_SECRET_ID"),
            smtp_server,
            smtp_port: 0,
            report_prefix: src.optional("REPORT_PREFIX", DEFAULT_REPORT_PREFIX),
            report_suffix: src.optional("REPORT_SUFFIX", DEFAULT_REPORT_SUFFIX),
        };

        if !src.missing.is_empty() {
            return Err(Error::Configuration(format!(
                "missing required configuration keys: {}",
                src.missing.join(", ")
            )));
        }

        let smtp_port = port
            .parse::<u16>()
            .map_err(|_| Error::Configuration(format!("invalid SMTP_PORT: {}", port)))?;

        Ok(Self {
            smtp_port,
            ..settings
        })
    }

    /// Log the resolved settings. Secret identifiers are reported only
    /// as present or absent.
    fn log(&self) {
        log::info!(
            "Settings: namespace={}, bucket={}, from={}, to={}, smtp={}:{}",
            self.namespace,
            self.bucket,
            self.email_from,
            self.email_to,
            self.smtp_server,
            self.smtp_port
        );
        log::info!(
            "SMTP_USERNAME_SECRET_ID: {}, SMTP_PASSWORD_SECRET_ID: {}",
            if self.smtp_username_secret_id.is_empty() { "NOT SET" } else { "SET" },
            if self.smtp_password_secret_id.is_empty() { "NOT SET" } else { "SET" },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_map() -> HashMap<String, String> {
        [
            ("NAMESPACE", "acme"),
            ("BUCKET_NAME", "cost-reports"),
            ("OBJECT_STORAGE_ENDPOINT", "https://storage.example.com"),
            ("VAULT_ENDPOINT", "https://vault.example.com"),
            ("EMAIL_FROM", "reports@example.com"),
            ("EMAIL_TO", "finance@example.com"),
            ("SMTP_USERNAME_SECRET_ID", "secret.user.1"),
            ("SMTP_PASSWORD_SECRET_ID", "secret.pass.1"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Settings, Error> {
        Settings::from_lookup(
            |key| map.get(key).cloned(),
            "BUCKET_NAME",
            "EMAIL_FROM",
            "EMAIL_TO",
            false,
        )
    }

    #[test]
    fn test_all_keys_present() {
        let settings = from_map(&full_map()).unwrap();

        assert_eq!(settings.namespace, "acme");
        assert_eq!(settings.bucket, "cost-reports");
        assert_eq!(settings.smtp_server, DEFAULT_SMTP_SERVER);
        assert_eq!(settings.smtp_port, 587);
        assert_eq!(settings.report_prefix, DEFAULT_REPORT_PREFIX);
        assert_eq!(settings.report_suffix, DEFAULT_REPORT_SUFFIX);
    }

    #[test]
    fn test_every_missing_key_is_listed() {
        let mut map = full_map();
        map.remove("NAMESPACE");
        map.remove("SMTP_PASSWORD_SECRET_ID");

        let err = from_map(&map).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("NAMESPACE"));
        assert!(msg.contains("SMTP_PASSWORD_SECRET_ID"));
        assert!(!msg.contains("EMAIL_FROM"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut map = full_map();
        map.insert("EMAIL_TO".to_string(), String::new());

        let err = from_map(&map).unwrap_err();
        assert!(err.to_string().contains("EMAIL_TO"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut map = full_map();
        map.insert("SMTP_PORT".to_string(), "smtp".to_string());

        let err = from_map(&map).unwrap_err();
        match err {
            Error::Configuration(ref msg) => assert!(msg.contains("SMTP_PORT")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_file_source_requires_smtp_keys() {
        // The env path defaults the SMTP endpoint; the file path must
        // spell it out.
        let err = Settings::from_lookup(
            |key| full_map().get(key).cloned(),
            "BUCKET_NAME",
            "EMAIL_FROM",
            "EMAIL_TO",
            true,
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("SMTP_SERVER"));
        assert!(msg.contains("SMTP_PORT"));
    }

    #[test]
    fn test_from_file_resolves_poller_key_spellings() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.env");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "NAMESPACE=acme").unwrap();
        writeln!(file, "REPORT_BUCKET_NAME=cost-reports").unwrap();
        writeln!(file, "OBJECT_STORAGE_ENDPOINT=https://storage.example.com").unwrap();
        writeln!(file, "VAULT_ENDPOINT=https://vault.example.com").unwrap();
        writeln!(file, "EMAIL_SENDER=reports@example.com").unwrap();
        writeln!(file, "EMAIL_RECIPIENT=finance@example.com").unwrap();
        writeln!(file, "SMTP_USERNAME_SECRET_ID=secret.user.1").unwrap();
        writeln!(file, "SMTP_PASSWORD_SECRET_ID=secret.pass.1").unwrap();
        writeln!(file, "SMTP_SERVER=smtp.example.com").unwrap();
        writeln!(file, "SMTP_PORT=2525").unwrap();
        drop(file);

        let settings = Settings::from_file(path.to_str().unwrap()).unwrap();

        assert_eq!(settings.bucket, "cost-reports");
        assert_eq!(settings.email_from, "reports@example.com");
        assert_eq!(settings.email_to, "finance@example.com");
        assert_eq!(settings.smtp_server, "smtp.example.com");
        assert_eq!(settings.smtp_port, 2525);
        assert_eq!(settings.report_prefix, DEFAULT_REPORT_PREFIX);
        assert_eq!(settings.report_suffix, DEFAULT_REPORT_SUFFIX);
    }

    #[test]
    fn test_from_file_lists_missing_smtp_keys() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.env");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "NAMESPACE=acme").unwrap();
        writeln!(file, "REPORT_BUCKET_NAME=cost-reports").unwrap();
        writeln!(file, "OBJECT_STORAGE_ENDPOINT=https://storage.example.com").unwrap();
        writeln!(file, "VAULT_ENDPOINT=https://vault.example.com").unwrap();
        writeln!(file, "EMAIL_SENDER=reports@example.com").unwrap();
        writeln!(file, "EMAIL_RECIPIENT=finance@example.com").unwrap();
        writeln!(file, "SMTP_USERNAME_SECRET_ID=secret.user.1").unwrap();
        writeln!(file, "SMTP_PASSWORD_SECRET_ID=secret.pass.1").unwrap();
        drop(file);

        let err = Settings::from_file(path.to_str().unwrap()).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("SMTP_SERVER"));
        assert!(msg.contains("SMTP_PORT"));
    }

    #[test]
    fn test_overridden_defaults() {
        let mut map = full_map();
        map.insert("SMTP_SERVER".to_string(), "smtp.example.com".to_string());
        map.insert("SMTP_PORT".to_string(), "2525".to_string());
        map.insert("REPORT_SUFFIX".to_string(), ".csv".to_string());

        let settings = from_map(&map).unwrap();
        assert_eq!(settings.smtp_server, "smtp.example.com");
        assert_eq!(settings.smtp_port, 2525);
        assert_eq!(settings.report_suffix, ".csv");
    }
}
