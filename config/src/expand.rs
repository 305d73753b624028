//! Lazy, recursive `${...}` macro resolution.
//!
//! Values are stored raw and expanded at read time. Expansion scans for the
//! first `${` marker; the text after the marker is resolved first so that
//! nested macros are collapsed before the matching `}` is looked for. A
//! reference to a missing key is dropped from the output. An odd run of
//! backslashes in front of the marker escapes it: half of the run is kept
//! and the marker stays literal.

use crate::error::{Error, Result};
use crate::store::ConfigStore;

/// Recursion cap for macro resolution. Past the cap a template is returned
/// unresolved instead of erroring, so a self-referential macro degrades to
/// its literal text rather than looping.
const MAX_MACRO_DEPTH: usize = 100;

impl ConfigStore {
  /// Expands every macro reference in `template` against this store.
  pub fn expand(&self, template: &str) -> Result<String> {
    self.expand_depth(template, 0)
  }

  pub(crate) fn expand_depth(&self, template: &str, depth: usize) -> Result<String> {
    if depth > MAX_MACRO_DEPTH {
      return Ok(template.to_string());
    }
    let Some(pos) = template.find("${") else {
      return Ok(template.to_string());
    };

    let bytes = template.as_bytes();
    let mut backslashes = 0;
    while backslashes < pos && bytes[pos - 1 - backslashes] == b'\\' {
      backslashes += 1;
    }
    let after = &template[pos + 2..];

    if backslashes % 2 == 1 {
      // Escaped marker: keep half the run, keep the marker literal, and
      // expand only the remainder.
      let mut out = String::with_capacity(template.len());
      out.push_str(&template[..pos - backslashes]);
      for _ in 0..backslashes / 2 {
        out.push('\\');
      }
      out.push_str("${");
      out.push_str(&self.expand_depth(after, depth)?);
      return Ok(out);
    }

    // Resolve the tail first so the matching brace is found even through
    // nested macros.
    let resolved_after = self.expand_depth(after, depth)?;
    let close = resolved_after
      .find('}')
      .ok_or_else(|| Error::UnterminatedMacro {
        template: template.to_string(),
      })?;
    let inner_key = &resolved_after[..close];
    let trailing = &resolved_after[close + 1..];

    let mut out = String::with_capacity(template.len());
    out.push_str(&template[..pos]);
    if let Some(raw) = self.get_raw(inner_key) {
      out.push_str(&self.expand_depth(raw, depth + 1)?);
    }
    out.push_str(trailing);
    Ok(out)
  }
}
