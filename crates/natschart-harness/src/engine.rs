//! Template engine boundary
//!
//! The harness never renders templates itself. [`TemplateEngine`] is the
//! seam; [`HelmTemplate`] implements it by shelling out to `helm template`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::{HarnessError, Result};

/// Environment variable overriding the helm binary
pub const HELM_BIN_ENV: &str = "NATSCHART_HELM_BIN";

/// Environment variable pointing at the chart under test
pub const CHART_PATH_ENV: &str = "NATSCHART_CHART_PATH";

/// Renders a chart into a multi-document manifest bundle
#[cfg_attr(test, mockall::automock)]
pub trait TemplateEngine {
    /// Render `chart` as `release` into `namespace` with the parameter
    /// document stored at `values_file`.
    fn render(
        &self,
        chart: &Path,
        release: &str,
        namespace: &str,
        values_file: &Path,
    ) -> Result<String>;
}

/// Trait for reading engine configuration from the environment
///
/// Abstracts environment variables so tests never touch process state.
#[cfg_attr(test, mockall::automock)]
pub trait EngineEnv {
    /// Helm binary to invoke
    fn helm_binary(&self) -> String;

    /// Chart location, if configured
    fn chart_path(&self) -> Option<PathBuf>;
}

/// Default implementation that reads from environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEngineEnv;

impl EngineEnv for OsEngineEnv {
    fn helm_binary(&self) -> String {
        std::env::var(HELM_BIN_ENV).unwrap_or_else(|_| "helm".to_string())
    }

    fn chart_path(&self) -> Option<PathBuf> {
        std::env::var_os(CHART_PATH_ENV).map(PathBuf::from)
    }
}

/// `helm template` invoked as a subprocess
#[derive(Debug, Clone)]
pub struct HelmTemplate {
    binary: String,
    extra_args: Vec<String>,
}

impl Default for HelmTemplate {
    fn default() -> Self {
        Self::new("helm")
    }
}

impl HelmTemplate {
    /// Use the given helm binary
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: Vec::new(),
        }
    }

    /// Resolve the helm binary from the environment
    pub fn from_env(env: &dyn EngineEnv) -> Self {
        Self::new(env.helm_binary())
    }

    /// Append an argument to every invocation (e.g. `--kube-version`)
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Helm binary this engine invokes
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Full argument list for one render
    pub fn args(
        &self,
        chart: &Path,
        release: &str,
        namespace: &str,
        values_file: &Path,
    ) -> Vec<String> {
        let mut args = vec![
            "template".to_string(),
            release.to_string(),
            chart.to_string_lossy().into_owned(),
            "--namespace".to_string(),
            namespace.to_string(),
            "--values".to_string(),
            values_file.to_string_lossy().into_owned(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl TemplateEngine for HelmTemplate {
    fn render(
        &self,
        chart: &Path,
        release: &str,
        namespace: &str,
        values_file: &Path,
    ) -> Result<String> {
        let args = self.args(chart, release, namespace, values_file);
        debug!(binary = %self.binary, ?args, "running helm template");

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| {
                HarnessError::render(
                    release,
                    format!(
                        "failed to run `{} template`: {}. Is helm installed?",
                        self.binary, e
                    ),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::render(release, stderr.trim().to_string()));
        }

        String::from_utf8(output.stdout).map_err(|e| {
            HarnessError::render(release, format!("helm produced invalid UTF-8: {e}"))
        })
    }
}
