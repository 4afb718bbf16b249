//! YAML handling for rendered manifest bundles
//!
//! Documents are parsed with yaml-rust2 and converted to `serde_json::Value`
//! so typed resources can be decoded with `serde_json::from_value`. The
//! YAML-to-JSON conversion is taken from lattice-common's `yaml` module.

use serde_json::{Map, Number, Value};
use thiserror::Error;
use yaml_rust2::{Yaml, YamlLoader};

/// Error type for YAML parsing
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct YamlError(String);

/// Split a multi-document bundle on `---` marker lines.
///
/// Returns the raw text of every document, including empty and comment-only
/// ones; callers decide what to skip. A leading marker does not produce an
/// empty first document.
pub fn split_documents(bundle: &str) -> Vec<&str> {
    let mut docs = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    let mut seen_marker = false;

    for line in bundle.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if is_document_marker(line) {
            if seen_marker || line_start > start {
                docs.push(&bundle[start..line_start]);
            }
            start = offset;
            seen_marker = true;
        }
    }
    if start < bundle.len() {
        docs.push(&bundle[start..]);
    }
    docs
}

fn is_document_marker(line: &str) -> bool {
    let line = line.trim_end();
    line == "---" || line.starts_with("--- #")
}

/// Parse a single YAML document into a serde_json::Value.
///
/// Returns `Value::Null` for empty or comment-only input.
pub fn parse_yaml(input: &str) -> Result<Value, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Convert a yaml_rust2::Yaml value to serde_json::Value
fn yaml_to_json(yaml: Yaml) -> Result<Value, YamlError> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => {
            let f: f64 = s
                .parse()
                .map_err(|e: std::num::ParseFloatError| YamlError(e.to_string()))?;
            Ok(Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(arr) => arr
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| {
                let key = match k {
                    Yaml::String(s) => s,
                    Yaml::Integer(i) => i.to_string(),
                    Yaml::Real(r) => r,
                    Yaml::Boolean(b) => b.to_string(),
                    Yaml::Null => "null".to_string(),
                    _ => return Err(YamlError("unsupported YAML key type".to_string())),
                };
                yaml_to_json(v).map(|v| (key, v))
            })
            .collect::<Result<Map<String, Value>, _>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(YamlError("YAML aliases not supported".to_string())),
        Yaml::BadValue => Err(YamlError("bad YAML value".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_on_marker_lines() {
        let bundle = "---\n# Source: a.yaml\nkind: A\n---\nkind: B\n";
        let docs = split_documents(bundle);
        assert_eq!(docs, vec!["# Source: a.yaml\nkind: A\n", "kind: B\n"]);
    }

    #[test]
    fn split_without_leading_marker() {
        let docs = split_documents("kind: A\n---\nkind: B");
        assert_eq!(docs, vec!["kind: A\n", "kind: B"]);
    }

    #[test]
    fn split_keeps_empty_documents() {
        let docs = split_documents("---\n# Source: empty.yaml\n---\nkind: B\n---\n");
        assert_eq!(docs, vec!["# Source: empty.yaml\n", "kind: B\n"]);
    }

    #[test]
    fn dashes_inside_values_do_not_split() {
        let bundle = "kind: ConfigMap\ndata:\n  banner: |\n    ----\n    a---b\n";
        assert_eq!(split_documents(bundle).len(), 1);
    }

    #[test]
    fn split_empty_bundle() {
        assert!(split_documents("").is_empty());
    }

    #[test]
    fn parse_kubernetes_manifest() {
        let yaml = r#"
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: nats
spec:
  replicas: 3
  template:
    metadata:
      annotations:
        checksum/config: abc123
"#;
        let result = parse_yaml(yaml).unwrap();
        assert_eq!(result["kind"], "StatefulSet");
        assert_eq!(result["metadata"]["name"], "nats");
        assert_eq!(result["spec"]["replicas"], 3);
        assert_eq!(
            result["spec"]["template"]["metadata"]["annotations"]["checksum/config"],
            "abc123"
        );
    }

    #[test]
    fn parse_block_scalar_preserves_text() {
        let yaml = "data:\n  nats.conf: |\n    port: 4222\n    http_port: 8222\n";
        let result = parse_yaml(yaml).unwrap();
        assert_eq!(result["data"]["nats.conf"], "port: 4222\nhttp_port: 8222\n");
    }

    #[test]
    fn parse_comment_only_is_null() {
        assert_eq!(parse_yaml("# Source: nats/templates/empty.yaml\n").unwrap(), Value::Null);
        assert_eq!(parse_yaml("").unwrap(), Value::Null);
    }

    #[test]
    fn parse_invalid_yaml_fails() {
        assert!(parse_yaml("not: valid: yaml: {{").is_err());
    }

    #[test]
    fn parse_float_and_null() {
        let result = parse_yaml("ratio: 1.5\nempty: null").unwrap();
        assert_eq!(result["ratio"], 1.5);
        assert!(result["empty"].is_null());
    }
}
