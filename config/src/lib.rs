//! # Strand Config
//!
//! The textual configuration language that drives the Strand IoC container.
//!
//! The language is a sectioned key/value format with a few additions a
//! long-lived service configuration tends to need:
//!
//! - **Sections**: `[name]` prefixes the keys that follow with `name.`;
//!   `[name:type]` additionally records `name.@class = type`.
//! - **Append-merge**: `key += value` comma-concatenates onto a prior entry
//!   instead of overwriting it.
//! - **Escapes**: `\t \n \r \f \uXXXX \\`, a literal escape of any other
//!   character, and a trailing `\` that continues a value onto the next line.
//! - **Verbatim blocks**: a value starting with `'''` is captured raw, with
//!   no escape processing, until the next `'''` run.
//! - **Macros**: `${key}` references are resolved lazily at read time,
//!   recursively and with nesting; `\${` keeps the marker literal.
//! - **Comments**: `#` or `;` to end of line.
//!
//! ## Quick Start
//!
//! ```
//! use strand_config::ConfigStore;
//!
//! let mut store = ConfigStore::new();
//! store
//!   .load_str(
//!     "[db]\n\
//!      host = localhost\n\
//!      url = postgres://${db.host}/app\n",
//!   )
//!   .unwrap();
//!
//! assert_eq!(
//!   store.get("db.url").unwrap().as_deref(),
//!   Some("postgres://localhost/app")
//! );
//! ```

mod error;
mod expand;
mod parser;
mod store;

pub use error::{Error, Result};
pub use store::ConfigStore;
