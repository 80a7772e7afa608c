use clap::Parser;
use config::{Config, Environment, File};
use serde_derive::Deserialize;

use crate::error::Result;

#[derive(Debug, Parser)]
#[command(about = "Book artists into venues")]
pub struct Args {
    /// Settings file, with or without its extension.
    #[arg(long, default_value = "settings")]
    pub settings: String,
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Mark the session cookie `Secure`. Off for plain-http development.
    pub secure_cookies: bool,
}

impl Settings {
    /// Defaults, then the settings file if there is one, then `FYYUR_*`
    /// environment variables, then `--port`.
    pub fn load(args: &Args) -> Result<Settings> {
        let mut builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 5000_i64)?
            .set_default("database_url", "fyyur.db")?
            .set_default("secure_cookies", false)?
            .add_source(File::with_name(&args.settings).required(false))
            .add_source(Environment::with_prefix("FYYUR"));
        if let Some(port) = args.port {
            builder = builder.set_override("port", i64::from(port))?;
        }
        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(settings: String, port: Option<u16>) -> Args {
        Args { settings, port }
    }

    #[test]
    fn defaults_without_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").to_string_lossy().into_owned();

        let settings = Settings::load(&args(path, None)).unwrap();
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.database_url, "fyyur.db");
        assert!(!settings.secure_cookies);
    }

    #[test]
    fn file_then_port_flag() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
                "host": "0.0.0.0",
                "port": 8080,
                "database_url": "/var/lib/fyyur.db",
                "secure_cookies": true
            }"#,
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let settings = Settings::load(&args(path.clone(), None)).unwrap();
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.database_url, "/var/lib/fyyur.db");
        assert!(settings.secure_cookies);

        let settings = Settings::load(&args(path, Some(9000))).unwrap();
        assert_eq!(settings.port, 9000);
    }
}
