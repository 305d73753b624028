//! The flat configuration namespace: entries, override/append semantics and
//! the per-prefix parameter chains consumed by the container.

use crate::error::Result;
use crate::parser::Parser;

use std::collections::HashMap;
use std::path::Path;

/// A parsed configuration namespace.
///
/// Keys are dotted strings in a single process-wide namespace. Values are
/// stored raw; `${...}` macro references are resolved lazily, at read time,
/// never at write time. The store is built single-threaded at load time and
/// is read-only once bean resolution begins.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
  entries: HashMap<String, String>,
  // Ordered local property names per dotted prefix, oldest first. Reserved
  // `@` locals are never recorded here.
  chains: HashMap<String, Vec<String>>,
}

impl ConfigStore {
  /// Creates a new, empty store.
  pub fn new() -> Self {
    Self::default()
  }

  // --- LOADING ---

  /// Parses `text` into the store. May be called more than once; later
  /// loads overwrite (or append to, via `+=`) earlier entries.
  pub fn load_str(&mut self, text: &str) -> Result<()> {
    Parser::new(self).parse(text)?;
    log::debug!("config store holds {} entries after load", self.entries.len());
    Ok(())
  }

  /// Reads and parses the file at `path`.
  pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    self.load_str(&text)
  }

  // --- WRITING ---

  /// Stores `key = value` at the top level, overwriting any prior entry.
  pub fn put(&mut self, key: &str, value: &str) {
    self.put_entry(None, key, value, false);
  }

  /// Stores an entry, prefixing `key` with `section + "."` when a section is
  /// given. With `append` set and a prior entry present under the resulting
  /// key, the new value is comma-concatenated onto the prior one; otherwise
  /// the entry is overwritten.
  pub fn put_entry(&mut self, section: Option<&str>, key: &str, value: &str, append: bool) {
    let full = match section {
      Some(s) if !s.is_empty() => format!("{s}.{key}"),
      _ => key.to_string(),
    };
    if append {
      if let Some(prior) = self.entries.get_mut(&full) {
        prior.push(',');
        prior.push_str(value);
        self.record_chain(&full);
        return;
      }
    }
    self.entries.insert(full.clone(), value.to_string());
    self.record_chain(&full);
  }

  fn record_chain(&mut self, full: &str) {
    if let Some((name, local)) = full.rsplit_once('.') {
      if name.is_empty() || local.is_empty() || local.starts_with('@') {
        return;
      }
      let chain = self.chains.entry(name.to_string()).or_default();
      if !chain.iter().any(|p| p == local) {
        chain.push(local.to_string());
      }
    }
  }

  // --- READING ---

  /// Returns the fully macro-resolved value for `key`, or `None` when the
  /// key is absent. Resolution happens here, at read time.
  pub fn get(&self, key: &str) -> Result<Option<String>> {
    match self.entries.get(key) {
      Some(value) => self.expand_depth(value, 0).map(Some),
      None => Ok(None),
    }
  }

  /// Returns the raw, unresolved value for `key`.
  pub fn get_raw(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(String::as_str)
  }

  /// Whether an entry exists under `key`.
  pub fn contains_key(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  /// Number of stored entries.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Whether the store holds no entries.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The ordered local property names recorded under the dotted prefix
  /// `name`, oldest first. Empty when nothing was recorded.
  pub fn param_chain(&self, name: &str) -> &[String] {
    self.chains.get(name).map(Vec::as_slice).unwrap_or(&[])
  }

  // --- EXPORT ---

  /// Materializes every entry into a plain map, with full macro resolution
  /// applied to each value.
  pub fn export(&self) -> Result<HashMap<String, String>> {
    self.export_filtered(None)
  }

  /// Like [`export`](Self::export), but keeps only keys starting with
  /// `prefix` and strips the prefix from the exported keys.
  pub fn export_by_prefix(&self, prefix: &str) -> Result<HashMap<String, String>> {
    self.export_filtered(Some(prefix))
  }

  fn export_filtered(&self, prefix: Option<&str>) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for (key, value) in &self.entries {
      let exported = match prefix {
        Some(p) => match key.strip_prefix(p) {
          Some(rest) => rest,
          None => continue,
        },
        None => key.as_str(),
      };
      out.insert(exported.to_string(), self.expand_depth(value, 0)?);
    }
    Ok(out)
  }
}
