//! CLI commands

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use natschart_harness::engine::{CHART_PATH_ENV, HELM_BIN_ENV};
use natschart_harness::{HelmTemplate, Renderer, TestCase, DEFAULT_HOST_IDENTITY};
use serde_json::Value;

use crate::{Error, Result};

pub mod check;
pub mod render;

/// Arguments selecting the chart and how to render it
#[derive(Args, Debug, Clone)]
pub struct ChartArgs {
    /// Chart directory or archive
    #[arg(long, env = CHART_PATH_ENV)]
    pub chart: PathBuf,

    /// Values file with parameter overrides
    #[arg(long, short = 'f')]
    pub values: Option<PathBuf>,

    /// Release name
    #[arg(long, default_value = "nats")]
    pub release: String,

    /// Namespace to render into
    #[arg(long, short = 'n', default_value = "nats")]
    pub namespace: String,

    /// Chart name component of resource names (nameOverride)
    #[arg(long)]
    pub name_override: Option<String>,

    /// Resource base name, ignoring release and chart name (fullnameOverride)
    #[arg(long)]
    pub full_name: Option<String>,

    /// Host identity substituted for $HOSTNAME in the server config
    #[arg(long, default_value = DEFAULT_HOST_IDENTITY)]
    pub host_identity: String,

    /// Helm binary
    #[arg(long, env = HELM_BIN_ENV, default_value = "helm")]
    pub helm: String,
}

impl ChartArgs {
    /// Build the test case these arguments describe
    pub fn test_case(&self) -> Result<TestCase> {
        let mut case = TestCase::new(&self.chart)
            .with_release(&self.release)
            .with_namespace(&self.namespace)
            .with_host_identity(&self.host_identity);
        if let Some(name) = &self.name_override {
            case = case.with_name_override(name);
        }
        if let Some(full_name) = &self.full_name {
            case = case.with_full_name(full_name);
        }
        if let Some(path) = &self.values {
            case = case.with_values(read_file(path)?);
        }
        Ok(case)
    }

    /// Renderer invoking the configured helm binary
    pub fn renderer(&self) -> Renderer {
        Renderer::new(HelmTemplate::new(&self.helm))
    }
}

/// Output format for slot values
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Render a slot value in the requested format
pub fn format_value(value: &Value, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
    })
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::read_file(path, e))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    fn chart_args() -> ChartArgs {
        ChartArgs {
            chart: PathBuf::from("charts/nats"),
            values: None,
            release: "events".to_string(),
            namespace: "messaging".to_string(),
            name_override: None,
            full_name: None,
            host_identity: "events-1".to_string(),
            helm: "helm".to_string(),
        }
    }

    #[test]
    fn test_case_follows_release() {
        let case = chart_args().test_case().unwrap();
        assert_eq!(case.release_name, "events");
        assert_eq!(case.full_name, "events-nats");
        assert_eq!(case.namespace, "messaging");
        assert_eq!(case.host_identity, "events-1");
        assert_eq!(case.values, "{}");
    }

    #[test]
    fn name_override_replaces_chart_name() {
        let args = ChartArgs {
            name_override: Some("jetstream".to_string()),
            ..chart_args()
        };
        assert_eq!(args.test_case().unwrap().full_name, "events-jetstream");
    }

    #[test]
    fn full_name_override_wins() {
        let args = ChartArgs {
            name_override: Some("jetstream".to_string()),
            full_name: Some("messaging-bus".to_string()),
            ..chart_args()
        };
        assert_eq!(args.test_case().unwrap().full_name, "messaging-bus");
    }

    #[test]
    fn values_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"config:\n  jetstream:\n    enabled: true\n")
            .unwrap();
        let args = ChartArgs {
            values: Some(file.path().to_path_buf()),
            ..chart_args()
        };
        assert!(args.test_case().unwrap().values.contains("jetstream"));
    }

    #[test]
    fn missing_values_file_names_path() {
        let args = ChartArgs {
            values: Some(PathBuf::from("/nonexistent/values.yaml")),
            ..chart_args()
        };
        let err = args.test_case().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/values.yaml"));
    }

    #[test]
    fn formats_yaml_and_json() {
        let value = json!({"port": 4222});
        assert_eq!(format_value(&value, OutputFormat::Yaml).unwrap(), "port: 4222\n");
        assert_eq!(
            format_value(&value, OutputFormat::Json).unwrap(),
            "{\n  \"port\": 4222\n}"
        );
    }
}
