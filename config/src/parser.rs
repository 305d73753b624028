//! The finite-state scanner for the configuration language.
//!
//! The scanner walks the input one character at a time. Keys and section
//! headers accumulate in the TEXT state; an `=` with a non-empty pending key
//! switches into VALUE, where escapes, line continuations and verbatim
//! blocks are handled. Comments consume to end of line from either side.

use crate::error::{Error, Result};
use crate::store::ConfigStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Text,
  Comment,
  Value,
  Escape,
  EscapeNewline,
  Unicode,
  Verbatim,
}

pub(crate) struct Parser<'a> {
  store: &'a mut ConfigStore,
  state: State,
  section: Option<String>,
  key: Option<String>,
  append: bool,
  // Key/header accumulation while in TEXT.
  buf: String,
  value: String,
  // Value length up to which trailing-whitespace trimming is forbidden;
  // advanced past every escaped character and verbatim block.
  protect: usize,
  // Quote run at the start of a value (verbatim detection).
  quotes: u8,
  // Quote run inside a verbatim block (terminator detection).
  vquotes: u8,
  hex: String,
  line: usize,
}

impl<'a> Parser<'a> {
  pub(crate) fn new(store: &'a mut ConfigStore) -> Self {
    Self {
      store,
      state: State::Text,
      section: None,
      key: None,
      append: false,
      buf: String::new(),
      value: String::new(),
      protect: 0,
      quotes: 0,
      vquotes: 0,
      hex: String::new(),
      line: 1,
    }
  }

  pub(crate) fn parse(&mut self, text: &str) -> Result<()> {
    for ch in text.chars() {
      self.feed(ch)?;
    }
    self.finish()
  }

  fn feed(&mut self, ch: char) -> Result<()> {
    if ch == '\n' {
      self.line += 1;
    }
    match self.state {
      State::Text => self.feed_text(ch),
      State::Comment => {
        if ch == '\n' {
          self.state = State::Text;
        }
        Ok(())
      }
      State::Value => self.feed_value(ch),
      State::Escape => self.feed_escape(ch),
      State::EscapeNewline => {
        self.state = State::Value;
        if ch == '\n' {
          Ok(())
        } else {
          self.feed(ch)
        }
      }
      State::Unicode => self.feed_unicode(ch),
      State::Verbatim => {
        self.feed_verbatim(ch);
        Ok(())
      }
    }
  }

  // --- TEXT ---

  fn feed_text(&mut self, ch: char) -> Result<()> {
    match ch {
      '#' | ';' => {
        self.end_text_line();
        self.state = State::Comment;
      }
      '\n' => self.end_text_line(),
      '=' => {
        let trimmed = self.buf.trim();
        let (key, append) = match trimmed.strip_suffix('+') {
          Some(head) => (head.trim_end(), true),
          None => (trimmed, false),
        };
        if key.is_empty() {
          // No pending key: the '=' is ordinary text.
          self.buf.push('=');
        } else {
          self.key = Some(key.to_string());
          self.append = append;
          self.buf.clear();
          self.value.clear();
          self.protect = 0;
          self.quotes = 0;
          self.state = State::Value;
        }
      }
      _ => self.buf.push(ch),
    }
    Ok(())
  }

  /// Processes a completed TEXT line: a `[name]` or `[name:type]` header
  /// opens a section (the typed form also emits `name.@class = type`);
  /// anything else is discarded.
  fn end_text_line(&mut self) {
    let trimmed = self.buf.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
      let inner = trimmed[1..trimmed.len() - 1].trim();
      match inner.split_once(':') {
        Some((name, ty)) => {
          let name = name.trim();
          let ty = ty.trim();
          if !name.is_empty() && !ty.is_empty() {
            self.store.put_entry(None, &format!("{name}.@class"), ty, false);
          }
          self.section = (!name.is_empty()).then(|| name.to_string());
        }
        None => {
          self.section = (!inner.is_empty()).then(|| inner.to_string());
        }
      }
    }
    self.buf.clear();
  }

  // --- VALUE ---

  fn feed_value(&mut self, ch: char) -> Result<()> {
    if ch == '\'' && self.value.is_empty() && self.protect == 0 {
      self.quotes += 1;
      if self.quotes == 3 {
        self.quotes = 0;
        self.vquotes = 0;
        self.state = State::Verbatim;
      }
      return Ok(());
    }
    self.flush_quotes();
    match ch {
      '\\' => self.state = State::Escape,
      '\n' => self.finish_entry(),
      '#' | ';' => {
        self.finish_entry();
        self.state = State::Comment;
      }
      ' ' | '\t' if self.value.is_empty() && self.protect == 0 => {}
      '\r' => {}
      _ => self.value.push(ch),
    }
    Ok(())
  }

  fn flush_quotes(&mut self) {
    for _ in 0..self.quotes {
      self.value.push('\'');
    }
    self.quotes = 0;
  }

  fn finish_entry(&mut self) {
    if let Some(key) = self.key.take() {
      while self.value.len() > self.protect {
        match self.value.chars().last() {
          Some(' ') | Some('\t') | Some('\r') => {
            self.value.pop();
          }
          _ => break,
        }
      }
      self
        .store
        .put_entry(self.section.as_deref(), &key, &self.value, self.append);
    }
    self.value.clear();
    self.append = false;
    self.buf.clear();
    self.state = State::Text;
  }

  // --- ESCAPES ---

  fn feed_escape(&mut self, ch: char) -> Result<()> {
    match ch {
      't' => self.push_escaped('\t'),
      'n' => self.push_escaped('\n'),
      'r' => self.push_escaped('\r'),
      'f' => self.push_escaped('\u{000C}'),
      '\\' => self.push_escaped('\\'),
      'u' => {
        self.hex.clear();
        self.state = State::Unicode;
        return Ok(());
      }
      '\r' => {
        self.state = State::EscapeNewline;
        return Ok(());
      }
      // Trailing backslash before a newline continues the value; the
      // newline itself is swallowed.
      '\n' => {
        self.state = State::Value;
        return Ok(());
      }
      // `\$` keeps its backslash: macro resolution counts the run in
      // front of `${` at read time to decide whether the marker is
      // escaped.
      '$' => {
        self.push_escaped('\\');
        self.push_escaped('$');
      }
      other => self.push_escaped(other),
    }
    self.state = State::Value;
    Ok(())
  }

  fn feed_unicode(&mut self, ch: char) -> Result<()> {
    if !ch.is_ascii_hexdigit() {
      return Err(Error::BadEscape {
        sequence: format!("u{}{}", self.hex, ch),
        line: self.line,
      });
    }
    self.hex.push(ch);
    if self.hex.len() == 4 {
      let decoded = u32::from_str_radix(&self.hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| Error::BadEscape {
          sequence: format!("u{}", self.hex),
          line: self.line,
        })?;
      self.push_escaped(decoded);
      self.state = State::Value;
    }
    Ok(())
  }

  fn push_escaped(&mut self, ch: char) {
    self.value.push(ch);
    self.protect = self.value.len();
  }

  // --- VERBATIM ---

  fn feed_verbatim(&mut self, ch: char) {
    if ch == '\'' {
      self.vquotes += 1;
      if self.vquotes == 3 {
        self.vquotes = 0;
        self.protect = self.value.len();
        self.state = State::Value;
      }
      return;
    }
    for _ in 0..self.vquotes {
      self.value.push('\'');
    }
    self.vquotes = 0;
    self.value.push(ch);
  }

  // --- EOF ---

  fn finish(&mut self) -> Result<()> {
    match self.state {
      State::Text => {
        self.end_text_line();
        Ok(())
      }
      State::Comment => Ok(()),
      State::Value => {
        self.flush_quotes();
        self.finish_entry();
        Ok(())
      }
      // A lone trailing backslash is kept literally.
      State::Escape => {
        self.push_escaped('\\');
        self.finish_entry();
        Ok(())
      }
      State::EscapeNewline => {
        self.finish_entry();
        Ok(())
      }
      State::Unicode => Err(Error::BadEscape {
        sequence: format!("u{}", self.hex),
        line: self.line,
      }),
      // An unterminated verbatim block keeps whatever was captured.
      State::Verbatim => {
        for _ in 0..self.vquotes {
          self.value.push('\'');
        }
        self.vquotes = 0;
        self.finish_entry();
        Ok(())
      }
    }
  }
}
