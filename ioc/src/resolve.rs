//! Bean-name to type resolution and parameter layering over the
//! configuration store.

use crate::error::{Error, Result};
use crate::registry::{TypeDescriptor, TypeRegistry};

use strand_config::ConfigStore;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Splits a comma/line-separated configuration list into its trimmed,
/// non-empty items.
pub(crate) fn split_list(raw: &str) -> impl Iterator<Item = &str> {
  raw
    .split(|c: char| c == ',' || c == '\n' || c == '\r')
    .map(str::trim)
    .filter(|item| !item.is_empty())
}

/// Resolves a bean name to a concrete type descriptor by following the
/// chained `.@class` indirection.
pub(crate) struct TypeResolver<'a> {
  pub(crate) config: &'a ConfigStore,
  pub(crate) registry: &'a TypeRegistry,
  pub(crate) name_replacements: &'a HashMap<String, String>,
}

impl TypeResolver<'_> {
  /// Applies the name-replacement override, walks `name.@class` links until
  /// they run out, and looks the terminal type name up in the registry.
  ///
  /// A cyclic `.@class` chain is a configuration error and loops forever;
  /// it is deliberately not guarded.
  pub(crate) fn resolve(&self, name: &str) -> Result<Arc<TypeDescriptor>> {
    let mut name = self
      .name_replacements
      .get(name)
      .cloned()
      .unwrap_or_else(|| name.to_string());
    let mut terminal;
    loop {
      terminal = name.clone();
      match self.config.get(&format!("{name}.@class"))? {
        Some(next) => name = next,
        None => break,
      }
    }
    self
      .registry
      .by_name(&terminal)
      .ok_or(Error::UnknownType(terminal))
  }
}

/// Computes the flattened, precedence-ordered parameter set for a bean
/// name: ancestors first, `@extends` profiles next, the most specific
/// name's own entries last. Later writes win.
pub(crate) struct ParameterResolver<'a> {
  pub(crate) config: &'a ConfigStore,
}

impl ParameterResolver<'_> {
  pub(crate) fn resolve(&self, name: &str) -> Result<HashMap<String, String>> {
    // Ancestor chain, most general first.
    let mut chain = VecDeque::new();
    let mut current = name.to_string();
    loop {
      chain.push_front(current.clone());
      match self.config.get(&format!("{current}.@class"))? {
        Some(parent) => current = parent,
        None => break,
      }
    }

    let mut accumulator = HashMap::new();
    let mut visited = HashSet::new();
    for link in &chain {
      self.merge(link, &mut accumulator, &mut visited)?;
    }
    Ok(accumulator)
  }

  fn merge(
    &self,
    name: &str,
    accumulator: &mut HashMap<String, String>,
    visited: &mut HashSet<String>,
  ) -> Result<()> {
    // Guards `@extends` cycles.
    if !visited.insert(name.to_string()) {
      return Ok(());
    }
    // Extended profiles are layered in before the name's own entries.
    if let Some(extends) = self.config.get(&format!("{name}.@extends"))? {
      for base in split_list(&extends) {
        self.merge(base, accumulator, visited)?;
      }
    }
    for property in self.config.param_chain(name) {
      if let Some(value) = self.config.get(&format!("{name}.{property}"))? {
        accumulator.insert(property.clone(), value);
      }
    }
    Ok(())
  }
}
