//! NATS server configuration parsing
//!
//! Decodes the `nats.conf` text rendered by the chart into a
//! `serde_json::Map`, the same structured form the resource expectations in
//! `natschart-harness` are written against.
//!
//! Variable references (`$NAME`) resolve against enclosing blocks first and
//! then against an explicit variable environment held by the [`ConfParser`].
//! The process environment is never read, so concurrent parses with different
//! host identities do not interfere.
//!
//! ```
//! use natschart_conf::ConfParser;
//!
//! let conf = ConfParser::new()
//!     .with_host_identity("nats-0")
//!     .parse_str("port: 4222\nserver_name: $HOSTNAME")
//!     .unwrap();
//! assert_eq!(conf["port"], 4222);
//! assert_eq!(conf["server_name"], "nats-0");
//! ```

#![deny(missing_docs)]

mod error;
mod parser;
mod scalar;

pub use error::ConfError;
pub use parser::ConfParser;

/// Result type alias for configuration parsing
pub type Result<T> = std::result::Result<T, ConfError>;

/// Variable name bound by [`ConfParser::with_host_identity`]
pub const HOST_IDENTITY_VAR: &str = "HOSTNAME";

/// Maximum nesting of `include` directives
pub const MAX_INCLUDE_DEPTH: usize = 10;
