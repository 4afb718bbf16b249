//! Overlay-and-compare engine
//!
//! Two registries built by [`Resources::build`] pair their slots by position.
//! [`reconcile`] first copies the content-derived fields the chart computes
//! (the config text and its checksum) from the actual registry into the
//! expected one, then [`compare`] walks both registries and reports every
//! difference. Nothing short-circuits: one run surfaces every mismatch.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::case::TestCase;
use crate::engine::TemplateEngine;
use crate::render::Renderer;
use crate::resources::Resources;
use crate::{Result, CONFIG_CHECKSUM_ANNOTATION, CONF_KEY};

/// A field whose value is derived from rendered content and cannot be
/// written down as a literal expectation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolatileField {
    /// `data["nats.conf"]` of the config ConfigMap
    ConfigText,
    /// `checksum/config` annotation on the StatefulSet pod template
    ConfigChecksum,
}

impl VolatileField {
    /// Every overlaid field, in application order
    pub const ALL: &'static [VolatileField] =
        &[VolatileField::ConfigText, VolatileField::ConfigChecksum];

    /// Human readable location of the field
    pub fn path(&self) -> &'static str {
        match self {
            VolatileField::ConfigText => "ConfigMap.data[nats.conf]",
            VolatileField::ConfigChecksum => {
                "StatefulSet.spec.template.metadata.annotations[checksum/config]"
            }
        }
    }

    /// Copy this field from `actual` into `expected`.
    ///
    /// Only applies when both slots are present and the actual field is set;
    /// containers missing on the expected side are created. Returns whether
    /// a value was copied.
    pub fn overlay(&self, expected: &mut Resources, actual: &Resources) -> bool {
        match self {
            VolatileField::ConfigText => {
                let Some(text) = actual
                    .config_map
                    .value()
                    .and_then(|cm| cm.data.as_ref())
                    .and_then(|data| data.get(CONF_KEY))
                else {
                    return false;
                };
                let Some(config_map) = expected.config_map.value_mut() else {
                    return false;
                };
                config_map
                    .data
                    .get_or_insert_with(Default::default)
                    .insert(CONF_KEY.to_string(), text.clone());
                true
            }
            VolatileField::ConfigChecksum => {
                let Some(checksum) = actual
                    .stateful_set
                    .value()
                    .and_then(|sts| sts.spec.as_ref())
                    .and_then(|spec| spec.template.metadata.as_ref())
                    .and_then(|meta| meta.annotations.as_ref())
                    .and_then(|annotations| annotations.get(CONFIG_CHECKSUM_ANNOTATION))
                else {
                    return false;
                };
                let Some(stateful_set) = expected.stateful_set.value_mut() else {
                    return false;
                };
                stateful_set
                    .spec
                    .get_or_insert_with(Default::default)
                    .template
                    .metadata
                    .get_or_insert_with(Default::default)
                    .annotations
                    .get_or_insert_with(Default::default)
                    .insert(CONFIG_CHECKSUM_ANNOTATION.to_string(), checksum.clone());
                true
            }
        }
    }
}

impl fmt::Display for VolatileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// One difference between an expected and an actual registry
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// The registries pair different slots at the same position
    Identity {
        /// Position in construction order
        position: usize,
        /// Identifier on the expected side
        expected: String,
        /// Identifier on the actual side
        actual: String,
    },
    /// One side holds a value, the other does not
    Presence {
        /// Slot identifier
        id: String,
        /// Whether the expected slot is present
        expected: bool,
        /// Whether the actual slot is present
        actual: bool,
    },
    /// Both sides hold a value and the values differ
    Value {
        /// Slot identifier
        id: String,
        /// Expected value as JSON
        expected: Value,
        /// Actual value as JSON
        actual: Value,
    },
}

impl Mismatch {
    /// Identifier of the slot this mismatch concerns (the expected side for
    /// identity mismatches)
    pub fn id(&self) -> &str {
        match self {
            Mismatch::Identity { expected, .. } => expected,
            Mismatch::Presence { id, .. } | Mismatch::Value { id, .. } => id,
        }
    }
}

fn presence(present: bool) -> &'static str {
    if present {
        "present"
    } else {
        "absent"
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Identity {
                position,
                expected,
                actual,
            } => write!(
                f,
                "slot #{position}: expected identifier {expected}, got {actual}"
            ),
            Mismatch::Presence {
                id,
                expected,
                actual,
            } => write!(
                f,
                "{id}: expected {}, rendered {}",
                presence(*expected),
                presence(*actual)
            ),
            Mismatch::Value {
                id,
                expected,
                actual,
            } => write!(
                f,
                "{id}: value differs\n  expected: {expected}\n  actual:   {actual}"
            ),
        }
    }
}

/// Copy every [`VolatileField`] from `actual` into `expected`.
///
/// Returns the number of fields copied. Applying it twice has the same
/// effect as applying it once.
pub fn reconcile(expected: &mut Resources, actual: &Resources) -> usize {
    VolatileField::ALL
        .iter()
        .filter(|field| {
            let copied = field.overlay(expected, actual);
            if copied {
                debug!(field = %field, "overlaid volatile field");
            }
            copied
        })
        .count()
}

/// Compare two registries slot by slot.
///
/// A presence mismatch is reported when exactly one side is present; values
/// are compared only when both are. Slots whose identifiers disagree are
/// reported as identity mismatches and not compared further.
pub fn compare(expected: &Resources, actual: &Resources) -> Vec<Mismatch> {
    expected
        .entries()
        .into_iter()
        .zip(actual.entries())
        .enumerate()
        .filter_map(|(position, (exp, act))| {
            if exp.id() != act.id() {
                return Some(Mismatch::Identity {
                    position,
                    expected: exp.id().to_string(),
                    actual: act.id().to_string(),
                });
            }
            if exp.is_present() != act.is_present() {
                return Some(Mismatch::Presence {
                    id: act.id().to_string(),
                    expected: exp.is_present(),
                    actual: act.is_present(),
                });
            }
            if act.is_present() && !exp.same_value(act) {
                return Some(Mismatch::Value {
                    id: act.id().to_string(),
                    expected: exp.snapshot().unwrap_or(Value::Null),
                    actual: act.snapshot().unwrap_or(Value::Null),
                });
            }
            None
        })
        .collect()
}

/// Reconcile, then compare
pub fn check(expected: &mut Resources, actual: &Resources) -> Vec<Mismatch> {
    reconcile(expected, actual);
    let mismatches = compare(expected, actual);
    debug!(mismatches = mismatches.len(), "compared registries");
    mismatches
}

/// Render `case` and check the result against `expected`
pub fn render_and_check<E: TemplateEngine>(
    renderer: &Renderer<E>,
    case: &TestCase,
    expected: &mut Resources,
) -> Result<Vec<Mismatch>> {
    let actual = renderer.render(case)?;
    Ok(check(expected, &actual))
}

/// Panic listing every mismatch, if there are any
#[track_caller]
pub fn assert_no_mismatches(mismatches: &[Mismatch]) {
    if mismatches.is_empty() {
        return;
    }
    let listing: Vec<String> = mismatches.iter().map(|m| format!("- {m}")).collect();
    panic!(
        "{} slot mismatch(es):\n{}",
        mismatches.len(),
        listing.join("\n")
    );
}
