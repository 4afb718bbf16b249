//! Per-scenario render configuration

use std::path::{Path, PathBuf};

use crate::engine::EngineEnv;
use crate::{CHART_NAME, DEFAULT_HOST_IDENTITY, DEFAULT_RELEASE_NAME};

/// Longest name Kubernetes accepts for a DNS label
const MAX_NAME_LEN: usize = 63;

/// Base name the chart gives its resources.
///
/// The release is used as-is when it already contains `name`, otherwise the
/// two are joined as `<release>-<name>`. The result is cut to a DNS label
/// and never ends in `-`.
pub fn chart_full_name(release: &str, name: &str) -> String {
    let full = if release.contains(name) {
        release.to_string()
    } else {
        format!("{release}-{name}")
    };
    dns_label(&full)
}

fn dns_label(name: &str) -> String {
    let end = name
        .char_indices()
        .nth(MAX_NAME_LEN)
        .map_or(name.len(), |(i, _)| i);
    name[..end].trim_end_matches('-').to_string()
}

/// Everything needed to render the chart once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Chart directory or archive handed to the template engine
    pub chart_path: PathBuf,
    /// Helm release name
    pub release_name: String,
    /// Namespace rendered into namespaced resources
    pub namespace: String,
    /// Base name of every rendered resource; builds the registry
    pub full_name: String,
    /// Chart name component (`nameOverride`)
    pub name: String,
    /// Base name forced regardless of release (`fullnameOverride`)
    pub full_name_override: Option<String>,
    /// Parameter document (values) as YAML or JSON text
    pub values: String,
    /// Host identity bound to `$HOSTNAME` while decoding the server config
    pub host_identity: String,
}

impl TestCase {
    /// Scenario with default release, namespace, and no overrides
    pub fn new(chart_path: impl Into<PathBuf>) -> Self {
        Self {
            chart_path: chart_path.into(),
            release_name: DEFAULT_RELEASE_NAME.to_string(),
            namespace: DEFAULT_RELEASE_NAME.to_string(),
            full_name: chart_full_name(DEFAULT_RELEASE_NAME, CHART_NAME),
            name: CHART_NAME.to_string(),
            full_name_override: None,
            values: "{}".to_string(),
            host_identity: DEFAULT_HOST_IDENTITY.to_string(),
        }
    }

    /// Scenario for the chart configured in the environment, if any
    pub fn from_env(env: &dyn EngineEnv) -> Option<Self> {
        env.chart_path().map(Self::new)
    }

    /// Replace the parameter document
    pub fn with_values(mut self, values: impl Into<String>) -> Self {
        self.values = values.into();
        self
    }

    /// Render under a different release name.
    ///
    /// The chart derives resource names from the release, so the registry
    /// base name follows it unless a full name override is set.
    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release_name = release.into();
        self.derive_full_name();
        self
    }

    /// Replace the chart name component (`nameOverride`)
    pub fn with_name_override(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.derive_full_name();
        self
    }

    /// Render into a different namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Override the registry base name (e.g. when `fullnameOverride` is set)
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name_override = Some(full_name.into());
        self.derive_full_name();
        self
    }

    /// Decode the server config as a different replica
    pub fn with_host_identity(mut self, host: impl Into<String>) -> Self {
        self.host_identity = host.into();
        self
    }

    /// Chart location
    pub fn chart_path(&self) -> &Path {
        &self.chart_path
    }

    fn derive_full_name(&mut self) {
        self.full_name = match &self.full_name_override {
            Some(name) => dns_label(name),
            None => chart_full_name(&self.release_name, &self.name),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngineEnv;

    #[test]
    fn defaults_match_chart_defaults() {
        let case = TestCase::new("/charts/nats");
        assert_eq!(case.chart_path(), Path::new("/charts/nats"));
        assert_eq!(case.release_name, "nats");
        assert_eq!(case.namespace, "nats");
        assert_eq!(case.full_name, "nats");
        assert_eq!(case.values, "{}");
        assert_eq!(case.host_identity, "nats-0");
    }

    #[test]
    fn full_name_joins_release_and_chart_name() {
        assert_eq!(chart_full_name("nats", "nats"), "nats");
        assert_eq!(chart_full_name("events", "nats"), "events-nats");
        assert_eq!(chart_full_name("my-nats-cluster", "nats"), "my-nats-cluster");
        assert_eq!(chart_full_name("events", "jetstream"), "events-jetstream");
    }

    #[test]
    fn full_name_is_cut_to_a_dns_label() {
        let release = format!("{}-x", "a".repeat(61));
        let full = chart_full_name(&release, "nats");
        assert_eq!(full, "a".repeat(61) + "-x");

        let release = "b".repeat(62);
        let full = chart_full_name(&release, "nats");
        assert_eq!(full, "b".repeat(62));
        assert!(!full.ends_with('-'));
    }

    #[test]
    fn release_renames_full_name() {
        let case = TestCase::new("chart").with_release("events");
        assert_eq!(case.full_name, "events-nats");

        let case = case.with_name_override("jetstream");
        assert_eq!(case.full_name, "events-jetstream");

        let case = case.with_full_name("messaging-bus");
        assert_eq!(case.release_name, "events");
        assert_eq!(case.full_name, "messaging-bus");
    }

    #[test]
    fn full_name_override_survives_release_change() {
        let case = TestCase::new("chart")
            .with_full_name("messaging-bus")
            .with_release("events");
        assert_eq!(case.full_name, "messaging-bus");
    }

    #[test]
    fn from_env_requires_chart_path() {
        let mut env = MockEngineEnv::new();
        env.expect_chart_path().returning(|| None);
        assert!(TestCase::from_env(&env).is_none());

        let mut env = MockEngineEnv::new();
        env.expect_chart_path()
            .returning(|| Some(PathBuf::from("/src/nats-helm/nats")));
        let case = TestCase::from_env(&env).unwrap();
        assert_eq!(case.chart_path, PathBuf::from("/src/nats-helm/nats"));
    }
}
