//! Settings of the application.
//!
//! Read from an optional `settings` file (any format `config` understands)
//! and overridden by `EXPENSES__*` environment variables, e.g.
//! `EXPENSES__SERVER__PORT=8080`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Sheets {
    pub base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    pub sheets: Option<Sheets>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(Environment::with_prefix("EXPENSES").separator("__")),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("app.level", "info")?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Settings::from_config(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
            .unwrap()
    }

    #[test]
    fn level_defaults_to_info() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
        assert!(settings.sheets.is_none());
    }

    #[test]
    fn sqlite_server() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "./expenses.db" }

            [sheets]
            base_url = "https://sheets.example"
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(settings.app.level, "debug");
        assert_eq!(server.port, 3000);
        assert_eq!(server.bind, None);
        assert_eq!(server.database, Database::Sqlite("./expenses.db".to_string()));
        assert_eq!(settings.sheets.unwrap().base_url, "https://sheets.example");
    }

    #[test]
    fn memory_database() {
        let settings = parse(
            r#"
            [server]
            bind = "0.0.0.0"
            port = 8080
            database = "memory"
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(server.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.database, Database::Memory);
    }
}
