//! Service configuration
//!
//! Merges command-line overrides with the TOML bootstrap file. Precedence is
//! CLI, then environment (handled by clap and the root folder resolver), then
//! TOML, then compiled defaults.

use std::path::PathBuf;

use levelup_common::config::{
    RootFolderInitializer, RootFolderResolver, TomlConfig, XpConfig,
};

/// Values supplied on the command line (or their env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub root_folder: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub xp: XpConfig,
}

impl ServiceConfig {
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Self {
        let root_folder = RootFolderResolver::new("levelup-xp")
            .with_cli_arg(cli.root_folder)
            .with_toml_root(toml.root_folder)
            .resolve();

        let database_path = cli
            .database
            .or(toml.database_path)
            .unwrap_or_else(|| RootFolderInitializer::new(root_folder.clone()).database_path());

        Self {
            port: cli.port.unwrap_or(toml.port),
            root_folder,
            database_path,
            log_level: cli.log_level.unwrap_or(toml.logging.level),
            log_file: toml.logging.file,
            xp: toml.xp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levelup_common::config::DEFAULT_PORT;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_cli_overrides_toml() {
        std::env::remove_var("LEVELUP_ROOT_FOLDER");
        std::env::remove_var("LEVELUP_ROOT");

        let toml = TomlConfig::from_toml_str(
            r#"
port = 7000
root_folder = "/srv/levelup"
"#,
        )
        .unwrap();
        let cli = CliOverrides {
            port: Some(7100),
            ..Default::default()
        };

        let config = ServiceConfig::resolve(cli, toml);
        assert_eq!(config.port, 7100);
        assert_eq!(config.root_folder, PathBuf::from("/srv/levelup"));
        assert_eq!(config.database_path, PathBuf::from("/srv/levelup/levelup.db"));
    }

    #[test]
    #[serial]
    fn test_explicit_database_path_wins() {
        std::env::remove_var("LEVELUP_ROOT_FOLDER");
        std::env::remove_var("LEVELUP_ROOT");

        let toml = TomlConfig::from_toml_str(r#"database_path = "/data/xp.db""#).unwrap();
        let config = ServiceConfig::resolve(CliOverrides::default(), toml);

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_path, PathBuf::from("/data/xp.db"));
        assert_eq!(config.log_level, "info");
    }
}
