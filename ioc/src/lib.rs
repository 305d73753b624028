//! # Strand IoC
//!
//! A configuration-driven Inversion of Control container for long-lived
//! service instances, without a full framework around it.
//!
//! The container is wired from two inputs: a [`strand_config::ConfigStore`]
//! holding the textual configuration (sections, `.@class` type indirection,
//! `.@extends` parameter profiles, `${...}` macros) and a host-supplied
//! [`TypeRegistry`] of [`TypeDescriptor`]s describing how each bean type is
//! constructed and injected.
//!
//! ## Core Concepts
//!
//! - **Bean**: a named, container-managed instance, cached by name on first
//!   [`Container::get`].
//! - **Global bean**: a singleton resolved by type from the container's
//!   [`GlobalBeanManager`] pool, constructed cycle-safely on demand.
//! - **Bootstrap set**: the `@global` config key lists beans created
//!   eagerly in two phases so they may reference each other mutually.
//! - **Replacement**: build-time overrides swap one registered type (or
//!   bean name) for another everywhere it would be used.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Mutex;
//! use strand_ioc::{ContainerBuilder, TypeDescriptor};
//!
//! #[derive(Default)]
//! struct Greeter {
//!   message: Mutex<String>,
//! }
//!
//! let container = ContainerBuilder::new()
//!   .with_config_text(
//!     "[greeter]\n\
//!      message = Hello, World!\n",
//!   )
//!   .with_type(
//!     TypeDescriptor::new("greeter", Greeter::default).with_value_property(
//!       "message",
//!       |g: &Greeter, v: String| *g.message.lock().unwrap() = v,
//!     ),
//!   )
//!   .build()
//!   .unwrap();
//!
//! let greeter = container.get_as::<Greeter>("greeter").unwrap();
//! assert_eq!(*greeter.message.lock().unwrap(), "Hello, World!");
//! ```

mod builder;
mod container;
mod convert;
mod error;
mod global;
mod provider;
mod registry;
mod resolve;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use convert::{Converter, StdConverter};
pub use error::{Error, Result};
pub use global::{GlobalBeanManager, Globals};
pub use provider::BeanProvider;
pub use registry::{BeanRef, DeclaredType, Property, TypeDescriptor, TypeRegistry};
