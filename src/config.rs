use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser};
use publicgate_handler::Upstream;
use publicgate_visibility::{EnabledFlag, PublicSchemaConfig};
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Default, Deserialize, Parser)]
pub struct Config {
    /// Path of the config file
    #[clap(long, env = "CONFIG_FILE", default_value = "config.toml")]
    #[serde(skip)]
    pub file: PathBuf,

    #[clap(long, env, default_value = "127.0.0.1:8000")]
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path the GraphiQL page sends queries to
    #[clap(long, env, default_value = "")]
    #[serde(default)]
    pub path: String,

    /// Path of the SDL file describing the served schema
    #[clap(long, env = "SCHEMA_FILE", default_value = "schema.graphql")]
    #[serde(default = "default_schema")]
    pub schema: PathBuf,

    /// Seconds between two checks of the schema file, `0` disables reloading
    #[clap(long, env, default_value = "5")]
    #[serde(default = "default_schema_poll_interval")]
    pub schema_poll_interval: u64,

    #[clap(long, env, value_delimiter = ',')]
    #[serde(default)]
    pub forward_headers: Vec<String>,

    #[clap(flatten)]
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// `true`, `false`, or a template such as `{env.PUBLIC_SCHEMA}`
    #[clap(long, env = "PUBLIC_SCHEMA_ENABLED")]
    #[serde(skip)]
    pub public_schema_enabled: Option<String>,

    #[clap(skip)]
    #[serde(default)]
    pub public_schema: PublicSchemaConfig,
}

#[derive(Args, Debug, Default, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[clap(long = "upstream-addr", env = "UPSTREAM_ADDR")]
    pub addr: Option<String>,

    #[clap(long = "upstream-tls", env = "UPSTREAM_TLS")]
    #[serde(default)]
    pub tls: bool,

    #[clap(long = "upstream-query-path", env = "UPSTREAM_QUERY_PATH")]
    pub query_path: Option<String>,
}

impl Config {
    /// Parse the config file and environment variables.
    /// If the config file exists, it will be parsed first and ignore
    /// environment variables.
    pub fn try_parse() -> anyhow::Result<Self> {
        let mut env_config = Config::parse();

        if Path::exists(&env_config.file) {
            let file_config = std::fs::read_to_string(&env_config.file)
                .with_context(|| format!("Failed to read config file '{}'.", &env_config.file.display()))?;
            let mut file_config: Config = toml::from_str(&file_config)
                .with_context(|| format!("Failed to parse config file '{}'.", &env_config.file.display()))?;
            file_config.file = env_config.file;
            Ok(file_config)
        } else {
            if let Some(enabled) = env_config.public_schema_enabled.take() {
                env_config.public_schema.enabled = EnabledFlag::Template(enabled);
            }
            Ok(env_config)
        }
    }

    #[instrument(skip(self), ret, level = "trace")]
    pub fn create_upstream(&self) -> Option<Upstream> {
        self.upstream.addr.as_ref().map(|addr| Upstream {
            addr: addr.clone(),
            tls: self.upstream.tls,
            query_path: self.upstream.query_path.clone(),
        })
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_schema() -> PathBuf {
    PathBuf::from("schema.graphql")
}

fn default_schema_poll_interval() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    #[tokio::test]
    #[serial]
    async fn parse_base_env_vars() {
        std::env::set_var("CONFIG_FILE", "does_not_exist.toml");
        std::env::set_var("FORWARD_HEADERS", "authorization,x-test");
        std::env::set_var("UPSTREAM_ADDR", "users:4000");
        std::env::set_var("PUBLIC_SCHEMA_ENABLED", "{env.EXPOSE_PUBLIC_SCHEMA}");

        let parsed_config = Config::try_parse().expect("Failed to parse config");
        assert_eq!(parsed_config.bind, "127.0.0.1:8000");
        assert_eq!(parsed_config.file.display().to_string(), "does_not_exist.toml");
        assert_eq!(parsed_config.schema, PathBuf::from("schema.graphql"));
        assert_eq!(parsed_config.schema_poll_interval, 5);
        assert_eq!(parsed_config.forward_headers, vec![
            "authorization".to_string(),
            "x-test".to_string()
        ]);
        assert_eq!(
            parsed_config.public_schema.enabled,
            EnabledFlag::Template("{env.EXPOSE_PUBLIC_SCHEMA}".to_string())
        );
        assert_eq!(
            parsed_config.create_upstream(),
            Some(Upstream {
                addr: "users:4000".to_string(),
                tls: false,
                query_path: None,
            })
        );

        std::env::remove_var("CONFIG_FILE");
        std::env::remove_var("FORWARD_HEADERS");
        std::env::remove_var("UPSTREAM_ADDR");
        std::env::remove_var("PUBLIC_SCHEMA_ENABLED");
    }

    #[tokio::test]
    #[serial]
    async fn public_schema_is_disabled_by_default() {
        std::env::set_var("CONFIG_FILE", "does_not_exist.toml");

        let parsed_config = Config::try_parse().expect("Failed to parse config");
        assert_eq!(parsed_config.public_schema.enabled, EnabledFlag::Bool(false));
        assert!(parsed_config.create_upstream().is_none());

        std::env::remove_var("CONFIG_FILE");
    }

    #[tokio::test]
    #[serial]
    async fn parse_config_file() {
        let mut tmpfile = NamedTempFile::with_prefix("publicgate").expect("Failed to create temp config");
        write!(
            tmpfile,
            r#"
        bind = "0.0.0.0:4000"
        schema = "/etc/publicgate/schema.graphql"
        schema_poll_interval = 0
        forward_headers = ["authorization"]

        [upstream]
        addr = "users:4000"
        tls = true
        query_path = "/graphql"

        [public_schema]
        enabled = true
        "#
        )
        .expect("Failed to write temp config");
        std::env::set_var("CONFIG_FILE", tmpfile.path().display().to_string());
        std::env::set_var("BIND", "127.0.0.1:8000");

        let parsed_config = Config::try_parse().expect("Failed to parse config");
        assert_eq!(parsed_config.bind, "0.0.0.0:4000");
        assert_eq!(parsed_config.schema, PathBuf::from("/etc/publicgate/schema.graphql"));
        assert_eq!(parsed_config.schema_poll_interval, 0);
        assert_eq!(parsed_config.forward_headers, vec!["authorization".to_string()]);
        assert_eq!(parsed_config.public_schema.enabled, EnabledFlag::Bool(true));
        assert_eq!(
            parsed_config.create_upstream(),
            Some(Upstream {
                addr: "users:4000".to_string(),
                tls: true,
                query_path: Some("/graphql".to_string()),
            })
        );

        std::env::remove_var("CONFIG_FILE");
        std::env::remove_var("BIND");
    }

    #[tokio::test]
    #[serial]
    async fn parse_config_file_with_template_flag() {
        let mut tmpfile = NamedTempFile::with_prefix("publicgate").expect("Failed to create temp config");
        write!(
            tmpfile,
            r#"
        [public_schema]
        enabled = "{{env.EXPOSE_PUBLIC_SCHEMA}}"
        "#
        )
        .expect("Failed to write temp config");
        std::env::set_var("CONFIG_FILE", tmpfile.path().display().to_string());

        let parsed_config = Config::try_parse().expect("Failed to parse config");
        assert_eq!(
            parsed_config.public_schema.enabled,
            EnabledFlag::Template("{env.EXPOSE_PUBLIC_SCHEMA}".to_string())
        );
        assert_eq!(parsed_config.bind, "127.0.0.1:8000");
        assert!(parsed_config.create_upstream().is_none());

        std::env::remove_var("CONFIG_FILE");
    }
}
