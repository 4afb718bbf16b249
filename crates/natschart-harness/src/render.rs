//! Renderer adapter
//!
//! Runs the template engine for one [`TestCase`], routes the bundle into a
//! fresh [`Resources`] registry and decodes the server configuration carried
//! by the ConfigMap.

use std::io::Write;

use natschart_conf::ConfParser;
use serde_json::Value;
use tracing::{debug, info};

use crate::case::TestCase;
use crate::engine::{EngineEnv, HelmTemplate, TemplateEngine};
use crate::resources::Resources;
use crate::{HarnessError, Result, CONF_KEY};

/// Renders test cases into registries through a [`TemplateEngine`]
#[derive(Debug, Clone, Default)]
pub struct Renderer<E = HelmTemplate> {
    engine: E,
}

impl Renderer<HelmTemplate> {
    /// Renderer using the helm binary configured in the environment
    pub fn from_env(env: &dyn EngineEnv) -> Self {
        Self::new(HelmTemplate::from_env(env))
    }
}

impl<E: TemplateEngine> Renderer<E> {
    /// Create a renderer around an engine
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Render `case` into a fully populated registry.
    ///
    /// The parameter document is written to a temporary file that is removed
    /// when this returns, on success or failure.
    pub fn render(&self, case: &TestCase) -> Result<Resources> {
        let mut values = tempfile::Builder::new()
            .prefix("values-")
            .suffix(".yaml")
            .tempfile()?;
        values.write_all(case.values.as_bytes())?;
        values.flush()?;

        let bundle = self.engine.render(
            &case.chart_path,
            &case.release_name,
            &case.namespace,
            values.path(),
        )?;

        let mut resources = Resources::build(&case.full_name);
        let routed = resources.populate(&bundle)?;
        decode_conf(&mut resources, &case.host_identity)?;

        info!(
            release = %case.release_name,
            full_name = %case.full_name,
            routed,
            present = resources.present_ids().len(),
            "rendered chart"
        );
        Ok(resources)
    }
}

/// Decode the ConfigMap's `nats.conf` into the registry's conf slot.
///
/// Every `data` key is materialized in a scratch directory first so that
/// `include` directives between keys resolve. `$HOSTNAME` is bound to
/// `host_identity`.
pub fn decode_conf(resources: &mut Resources, host_identity: &str) -> Result<()> {
    let config_map_id = resources.config_map.id().to_string();
    let data = resources
        .config_map
        .value()
        .ok_or_else(|| HarnessError::missing_artifact(&config_map_id, "not rendered"))?
        .data
        .as_ref()
        .filter(|data| data.contains_key(CONF_KEY))
        .ok_or_else(|| {
            HarnessError::missing_artifact(&config_map_id, format!("data has no {CONF_KEY} key"))
        })?;

    let scratch = tempfile::tempdir()?;
    for (key, text) in data {
        if key.contains(['/', '\\']) || key == ".." {
            return Err(HarnessError::decode(
                &config_map_id,
                format!("data key {key:?} is not a file name"),
            ));
        }
        std::fs::write(scratch.path().join(key), text)?;
    }

    let conf = ConfParser::new()
        .with_host_identity(host_identity)
        .parse_file(scratch.path().join(CONF_KEY))?;
    debug!(keys = conf.len(), host_identity, "decoded server configuration");

    resources.conf.set(Value::Object(conf));
    Ok(())
}
