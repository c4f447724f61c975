//! Runtime configuration
//!
//! All values come from the process environment. The long flags exist only
//! for running the check by hand outside the cluster.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::{Error, Result};

/// Port the live probe dials on the public hostname
pub const PROBE_PORT: u16 = 443;

/// Fluentd RPC port serving the graceful reload endpoint
pub const RELOAD_PORT: u16 = 24444;

/// Fluentd RPC path that triggers an in-place config reload
pub const RELOAD_PATH: &str = "/api/config.gracefulReload";

/// Upper bound for a single reload request
pub const RELOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Label the StatefulSet controller puts on every pod it owns
pub const STATEFULSET_POD_LABEL: &str = "statefulset.kubernetes.io/pod-name";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Namespace holding both the Fluentd StatefulSet and its Certificate
    #[arg(long, env = "FLUENTD_NAMESPACE")]
    pub namespace: String,

    /// Externally reachable hostname whose served certificate is probed
    #[arg(long, env = "FLUENTD_SERVICE_URL")]
    pub service_hostname: String,

    /// Name of the cert-manager Certificate tracking the served certificate
    #[arg(long, env = "FLUENTD_CERTIFICATE_NAME")]
    pub certificate_name: String,

    /// Log the replicas that would be reloaded without contacting them
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// What the command line asked for
#[derive(Clone, Debug)]
pub enum Invocation {
    /// Perform a check with this configuration
    Run(Config),
    /// `--help` or `--version`: print the text and exit successfully
    Print(String),
}

impl Config {
    /// Parse the configuration from the environment (and flags, if any)
    pub fn load() -> Result<Invocation> {
        Self::from_args(std::env::args_os())
    }

    pub fn from_args<I, T>(args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = match Self::try_parse_from(args) {
            Ok(config) => config,
            Err(e) => {
                return match e.kind() {
                    clap::error::ErrorKind::DisplayHelp
                    | clap::error::ErrorKind::DisplayVersion => {
                        Ok(Invocation::Print(e.render().to_string()))
                    }
                    _ => Err(Error::ConfigError(e.to_string())),
                }
            }
        };
        config.validate()?;
        Ok(Invocation::Run(config))
    }

    /// Reject values that are present but blank
    pub fn validate(&self) -> Result<()> {
        for (var, value) in [
            ("FLUENTD_NAMESPACE", &self.namespace),
            ("FLUENTD_SERVICE_URL", &self.service_hostname),
            ("FLUENTD_CERTIFICATE_NAME", &self.certificate_name),
        ] {
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!("{var} is not set")));
            }
        }
        Ok(())
    }

    /// Label selector matching the Fluentd pods of this namespace
    pub fn replica_selector(&self) -> String {
        replica_selector(&self.namespace)
    }
}

/// Fluentd pods are labelled `app=<namespace>`
pub fn replica_selector(namespace: &str) -> String {
    format!("app={namespace}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Config> {
        match Config::from_args(args(extra))? {
            Invocation::Run(config) => Ok(config),
            Invocation::Print(text) => panic!("unexpected help output: {text}"),
        }
    }

    fn args(extra: &[&str]) -> Vec<String> {
        let mut v = vec!["fluentd-cert-reloader".to_string()];
        v.extend(extra.iter().map(|s| s.to_string()));
        v
    }

    #[test]
    fn test_parses_all_required_values() {
        let config = parse(&[
            "--namespace",
            "fluentd",
            "--service-hostname",
            "logs.example.com",
            "--certificate-name",
            "fluentd-tls",
        ])
        .unwrap();

        assert_eq!(config.namespace, "fluentd");
        assert_eq!(config.service_hostname, "logs.example.com");
        assert_eq!(config.certificate_name, "fluentd-tls");
        assert!(!config.dry_run);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.replica_selector(), "app=fluentd");
    }

    #[test]
    fn test_blank_value_is_config_error() {
        let err = parse(&[
            "--namespace",
            "fluentd",
            "--service-hostname",
            "  ",
            "--certificate-name",
            "fluentd-tls",
        ])
        .unwrap_err();

        match err {
            Error::ConfigError(msg) => assert!(msg.contains("FLUENTD_SERVICE_URL")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_value_is_config_error() {
        let err = parse(&[
            "--namespace",
            "fluentd",
            "--service-hostname",
            "logs.example.com",
        ]);
        // FLUENTD_CERTIFICATE_NAME may be exported in a developer shell
        if std::env::var_os("FLUENTD_CERTIFICATE_NAME").is_none() {
            assert!(matches!(err, Err(Error::ConfigError(_))));
        }
    }

    #[test]
    fn test_json_log_format_and_dry_run() {
        let config = parse(&[
            "--namespace",
            "fluentd",
            "--service-hostname",
            "logs.example.com",
            "--certificate-name",
            "fluentd-tls",
            "--dry-run",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert!(config.dry_run);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_version_is_printed_not_exited() {
        match Config::from_args(args(&["--version"])).unwrap() {
            Invocation::Print(text) => assert!(text.contains(env!("CARGO_PKG_VERSION"))),
            Invocation::Run(_) => panic!("--version must not start a run"),
        }
    }

    #[test]
    fn test_help_is_printed_not_exited() {
        match Config::from_args(args(&["--help"])).unwrap() {
            Invocation::Print(text) => assert!(text.contains("FLUENTD_NAMESPACE")),
            Invocation::Run(_) => panic!("--help must not start a run"),
        }
    }

    #[test]
    fn test_replica_selector_format() {
        assert_eq!(replica_selector("logging"), "app=logging");
    }
}
