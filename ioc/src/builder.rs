//! The container builder: configuration sources, type descriptors,
//! providers, pre-registered globals and replacement overrides, turned into
//! a built [`Container`] in one all-or-nothing step.

use crate::container::Container;
use crate::convert::{Converter, StdConverter};
use crate::error::{Error, Result};
use crate::provider::BeanProvider;
use crate::registry::{BeanRef, TypeDescriptor, TypeRegistry};

use once_cell::sync::Lazy;
use strand_config::ConfigStore;

use std::any::{Any, TypeId};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

static DEFAULT_CONVERTER: Lazy<Arc<dyn Converter>> = Lazy::new(|| Arc::new(StdConverter));

enum Source {
  Text(String),
  File(PathBuf),
}

/// Collects everything a [`Container`] needs, then builds it.
///
/// Sources are parsed and replacements resolved inside [`build`](Self::build)
/// so that any fatal error aborts construction with no partial container
/// returned.
pub struct ContainerBuilder {
  sources: Vec<Source>,
  registry: TypeRegistry,
  converter: Arc<dyn Converter>,
  providers: Vec<Arc<dyn BeanProvider>>,
  class_replacements: Vec<(String, String)>,
  name_replacements: HashMap<String, String>,
  globals: Vec<(TypeId, BeanRef)>,
}

impl Default for ContainerBuilder {
  fn default() -> Self {
    Self {
      sources: Vec::new(),
      registry: TypeRegistry::new(),
      converter: DEFAULT_CONVERTER.clone(),
      providers: Vec::new(),
      class_replacements: Vec::new(),
      name_replacements: HashMap::new(),
      globals: Vec::new(),
    }
  }
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a configuration source from raw text. Later sources override
  /// earlier entries.
  pub fn with_config_text(mut self, text: impl Into<String>) -> Self {
    self.sources.push(Source::Text(text.into()));
    self
  }

  /// Adds a configuration source read from a file at build time.
  pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
    self.sources.push(Source::File(path.into()));
    self
  }

  /// Registers a type descriptor.
  pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
    self.registry.register(descriptor);
    self
  }

  /// Replaces the default [`StdConverter`].
  pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
    self.converter = converter;
    self
  }

  /// Adds an instance provider. Providers are sorted by descending
  /// priority at build time; insertion order breaks ties.
  pub fn with_provider(mut self, provider: Arc<dyn BeanProvider>) -> Self {
    self.providers.push(provider);
    self
  }

  /// Pre-registers `instance` as the global singleton for `T`.
  pub fn with_global<T: Any + Send + Sync>(mut self, instance: T) -> Self {
    self.globals.push((TypeId::of::<T>(), Arc::new(instance)));
    self
  }

  /// Overrides the type registered under `old` with the one under `new`,
  /// everywhere an instance of `old` would be constructed. The override is
  /// identity-keyed, and parameter resolution for `old` inherits `new`'s
  /// parameters through a synthetic `old.@extends` entry.
  pub fn replace_class(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
    self.class_replacements.push((old.into(), new.into()));
    self
  }

  /// Redirects every resolution of the bean name `old` to `new`.
  pub fn replace_bean(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
    self.name_replacements.insert(old.into(), new.into());
    self
  }

  /// Builds the container: loads and parses every source, resolves
  /// replacement overrides, sorts providers, seeds pre-registered globals
  /// and runs the two-phase `@global` bootstrap. Any fatal error aborts
  /// with no container returned.
  pub fn build(self) -> Result<Container> {
    let mut config = ConfigStore::new();
    for source in &self.sources {
      match source {
        Source::Text(text) => config.load_str(text)?,
        Source::File(path) => config.load_path(path)?,
      }
    }

    let mut type_replacements = HashMap::new();
    for (old, new) in &self.class_replacements {
      let old_descriptor = self
        .registry
        .by_name(old)
        .ok_or_else(|| Error::UnknownType(old.clone()))?;
      let new_descriptor = self
        .registry
        .by_name(new)
        .ok_or_else(|| Error::UnknownType(new.clone()))?;
      type_replacements.insert(old_descriptor.id(), new_descriptor.id());
      config.put_entry(None, &format!("{old}.@extends"), new, true);
    }

    let mut providers = self.providers;
    providers.sort_by_key(|p| Reverse(p.priority()));

    let container = Container::assemble(
      config,
      self.registry,
      self.converter,
      providers,
      type_replacements,
      self.name_replacements,
    );
    for (ty, bean) in self.globals {
      container.register_global_ref(ty, bean);
    }
    container.init_globals()?;
    log::debug!("container built");
    Ok(container)
  }
}
