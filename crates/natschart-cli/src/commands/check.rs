//! Check command

use std::path::{Path, PathBuf};

use clap::Args;
use natschart_conf::ConfParser;
use natschart_harness::{check, decode_conf, Resources, TestCase};
use serde_json::Value;
use tracing::info;

use super::{read_file, ChartArgs};
use crate::{Error, Result};

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub chart: ChartArgs,

    /// Manifest bundle holding the expected resources
    #[arg(long)]
    pub expected: PathBuf,

    /// Expected server configuration (decoded from the bundle's ConfigMap if omitted)
    #[arg(long)]
    pub expected_conf: Option<PathBuf>,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let case = args.chart.test_case()?;
    let mut expected = expected_resources(&case, &args.expected, args.expected_conf.as_deref())?;
    let actual = args.chart.renderer().render(&case)?;

    let mismatches = check(&mut expected, &actual);
    if mismatches.is_empty() {
        info!(release = %case.release_name, "rendered chart matches expectation");
        println!("No mismatches");
        return Ok(());
    }

    for mismatch in &mismatches {
        println!("  - {}", mismatch);
    }
    Err(Error::Mismatches {
        count: mismatches.len(),
    })
}

/// Build the expected registry from a manifest bundle and optional conf file
pub fn expected_resources(
    case: &TestCase,
    bundle: &Path,
    conf: Option<&Path>,
) -> Result<Resources> {
    let mut expected = Resources::build(&case.full_name);
    expected.populate(&read_file(bundle)?)?;

    match conf {
        Some(path) => {
            let conf = ConfParser::new()
                .with_host_identity(&case.host_identity)
                .parse_file(path)?;
            expected.conf.set(Value::Object(conf));
        }
        None if expected.config_map.is_present() => {
            decode_conf(&mut expected, &case.host_identity)?;
        }
        None => {}
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;

    const BUNDLE: &str = "---
apiVersion: v1
kind: ConfigMap
metadata:
  name: nats-config
data:
  nats.conf: |
    port: 4222
    server_name: $HOSTNAME
---
apiVersion: v1
kind: Service
metadata:
  name: nats
spec:
  ports:
  - name: nats
    port: 4222
";

    fn write_temp(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn conf_is_decoded_from_expected_bundle() {
        let bundle = write_temp(BUNDLE);
        let case = TestCase::new("chart").with_host_identity("nats-1");

        let expected = expected_resources(&case, bundle.path(), None).unwrap();
        assert_eq!(
            expected.present_ids(),
            vec!["nats.conf", "ConfigMap/nats-config", "Service/nats"]
        );
        assert_eq!(
            expected.conf.value().unwrap(),
            &json!({"port": 4222, "server_name": "nats-1"})
        );
    }

    #[test]
    fn explicit_conf_file_takes_precedence() {
        let bundle = write_temp(BUNDLE);
        let conf = write_temp("port: 4333\n");

        let expected =
            expected_resources(&TestCase::new("chart"), bundle.path(), Some(conf.path())).unwrap();
        assert_eq!(expected.conf.value().unwrap(), &json!({"port": 4333}));
    }

    #[test]
    fn bundle_without_config_map_leaves_conf_absent() {
        let bundle = write_temp("apiVersion: v1\nkind: Service\nmetadata:\n  name: nats\n");
        let expected = expected_resources(&TestCase::new("chart"), bundle.path(), None).unwrap();
        assert_eq!(expected.present_ids(), vec!["Service/nats"]);
    }
}
