//! Render-and-compare harness for the NATS Helm chart
//!
//! A scenario supplies a parameter document; the [`Renderer`] runs the
//! template engine and routes every rendered document into a typed
//! [`Resources`] registry. Test code builds an expected registry holding only
//! the slots and fields it cares about, and [`check`] reconciles the
//! content-derived fields before comparing both registries slot by slot.
//!
//! # Public API
//!
//! - [`Slot`], [`SlotEntry`]: presence-tracked holders and their type-erased view
//! - [`Resources`]: the fixed, ordered registry of chart artifacts
//! - [`Renderer`], [`TemplateEngine`], [`HelmTemplate`]: rendering pipeline
//! - [`reconcile`], [`compare`], [`check`], [`Mismatch`]: overlay-and-compare
//! - [`TestCase`]: per-scenario chart, release, and parameter configuration

#![deny(missing_docs)]

pub mod case;
pub mod compare;
pub mod document;
pub mod engine;
pub mod error;
pub mod monitoring;
pub mod render;
pub mod resources;
pub mod slot;
pub mod yaml;

pub use case::{chart_full_name, TestCase};
pub use compare::{
    assert_no_mismatches, check, compare, reconcile, render_and_check, Mismatch, VolatileField,
};
pub use document::{RenderedDocument, RoutingKey};
pub use engine::{EngineEnv, HelmTemplate, OsEngineEnv, TemplateEngine};
pub use error::{ErrorKind, HarnessError};
pub use render::{decode_conf, Renderer};
pub use resources::Resources;
pub use slot::{Slot, SlotEntry};

/// Result type alias using the harness error type
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Identifier of the slot holding the decoded server configuration
pub const CONF_SLOT_ID: &str = "nats.conf";

/// ConfigMap `data` key carrying the server configuration text
pub const CONF_KEY: &str = "nats.conf";

/// Pod template annotation carrying the configuration checksum
pub const CONFIG_CHECKSUM_ANNOTATION: &str = "checksum/config";

/// Default release and namespace
pub const DEFAULT_RELEASE_NAME: &str = "nats";

/// Chart name, the default `name` component of every resource name
pub const CHART_NAME: &str = "nats";

/// Host identity the first StatefulSet replica sees
pub const DEFAULT_HOST_IDENTITY: &str = "nats-0";
