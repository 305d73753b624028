use pretty_assertions::assert_eq;
use strand_config::ConfigStore;

fn load(text: &str) -> ConfigStore {
  let mut store = ConfigStore::new();
  store.load_str(text).expect("config should parse");
  store
}

fn value(store: &ConfigStore, key: &str) -> String {
  store
    .get(key)
    .expect("value should resolve")
    .unwrap_or_else(|| panic!("missing key '{key}'"))
}

// --- Sections & Assignments ---

#[test]
fn test_sections_prefix_keys() {
  let store = load(
    "top = 0\n\
     [foo]\n\
     x = 1\n\
     y = 2\n",
  );

  assert_eq!(value(&store, "top"), "0");
  assert_eq!(value(&store, "foo.x"), "1");
  assert_eq!(value(&store, "foo.y"), "2");
}

#[test]
fn test_typed_section_emits_class_entry() {
  let store = load(
    "[foo]\n\
     x = 1\n\
     [bar:foo]\n\
     x = 2\n",
  );

  assert_eq!(value(&store, "bar.@class"), "foo");
  assert_eq!(value(&store, "foo.x"), "1");
  assert_eq!(value(&store, "bar.x"), "2");
}

#[test]
fn test_keys_and_values_are_trimmed() {
  let store = load("   spaced key   =   padded value   \n");

  assert_eq!(value(&store, "spaced key"), "padded value");
}

#[test]
fn test_later_write_overwrites() {
  let store = load("k = first\nk = second\n");

  assert_eq!(value(&store, "k"), "second");
}

#[test]
fn test_append_concatenates_with_comma() {
  // Arrange / Act
  let store = load("k = 1\nk += 2\nk += 3\n");

  // Assert
  assert_eq!(value(&store, "k"), "1,2,3");
}

#[test]
fn test_append_without_prior_entry_starts_fresh() {
  let store = load("j += a\n");

  assert_eq!(value(&store, "j"), "a");
}

#[test]
fn test_equals_without_key_is_plain_text() {
  let store = load("= orphan value\nx = 1\n");

  assert_eq!(store.len(), 1);
  assert_eq!(value(&store, "x"), "1");
}

#[test]
fn test_param_chain_records_locals_in_order() {
  let store = load(
    "[foo]\n\
     x = 1\n\
     y = 2\n\
     [bar:foo]\n\
     z = 3\n",
  );

  assert_eq!(store.param_chain("foo"), ["x".to_string(), "y".to_string()]);
  // Reserved @ locals are never part of a chain.
  assert_eq!(store.param_chain("bar"), ["z".to_string()]);
}

// --- Comments ---

#[test]
fn test_comments_consume_to_end_of_line() {
  let store = load(
    "# full line comment\n\
     ; another one\n\
     x = 1 # trailing\n\
     y = 2 ; also trailing\n",
  );

  assert_eq!(store.len(), 2);
  assert_eq!(value(&store, "x"), "1");
  assert_eq!(value(&store, "y"), "2");
}

#[test]
fn test_section_header_survives_trailing_comment() {
  let store = load("[foo] # services\nx = 1\n");

  assert_eq!(value(&store, "foo.x"), "1");
}

// --- Escapes ---

#[test]
fn test_standard_escape_sequences() {
  let store = load("x = a\\tb\\nc\\rd\\fe\\\\f\n");

  assert_eq!(value(&store, "x"), "a\tb\nc\rd\u{000C}e\\f");
}

#[test]
fn test_unicode_escape() {
  let store = load("x = \\u0041\\u00e9\n");

  assert_eq!(value(&store, "x"), "Aé");
}

#[test]
fn test_literal_escape_of_any_character() {
  // An escaped comment character stays in the value.
  let store = load("x = a\\#b\n");

  assert_eq!(value(&store, "x"), "a#b");
}

#[test]
fn test_malformed_unicode_escape_is_fatal() {
  let mut store = ConfigStore::new();
  let result = store.load_str("x = \\u00zz\n");

  assert!(matches!(
    result,
    Err(strand_config::Error::BadEscape { .. })
  ));
}

#[test]
fn test_trailing_backslash_continues_the_value() {
  let store = load("x = one \\\ntwo\n");

  assert_eq!(value(&store, "x"), "one two");
}

#[test]
fn test_escaped_trailing_whitespace_is_kept() {
  let store = load("x = padded\\ \n");

  assert_eq!(value(&store, "x"), "padded ");
}

// --- Verbatim blocks ---

#[test]
fn test_verbatim_block_is_captured_raw() {
  let store = load("x = '''line1\nline2\\n # not a comment'''\n");

  assert_eq!(value(&store, "x"), "line1\nline2\\n # not a comment");
}

#[test]
fn test_short_quote_run_is_literal() {
  let store = load("x = ''quoted''\n");

  assert_eq!(value(&store, "x"), "''quoted''");
}

// --- Misc ---

#[test]
fn test_crlf_line_endings() {
  let store = load("a = 1\r\nb = 2\r\n");

  assert_eq!(value(&store, "a"), "1");
  assert_eq!(value(&store, "b"), "2");
}

#[test]
fn test_missing_final_newline() {
  let store = load("x = last");

  assert_eq!(value(&store, "x"), "last");
}

#[test]
fn test_programmatic_put_entry() {
  let mut store = ConfigStore::new();
  store.put_entry(Some("svc"), "timeout", "30", false);
  store.put_entry(None, "svc.timeout", "45", false);
  store.put("root", "yes");

  assert_eq!(value(&store, "svc.timeout"), "45");
  assert_eq!(value(&store, "root"), "yes");
}

#[test]
fn test_load_path_reads_a_file() {
  use std::io::Write;

  // Arrange
  let mut file = tempfile::NamedTempFile::new().expect("temp file");
  write!(file, "[svc]\nport = 8080\n").expect("write config");

  // Act
  let mut store = ConfigStore::new();
  store.load_path(file.path()).expect("load from path");

  // Assert
  assert_eq!(value(&store, "svc.port"), "8080");
}

#[test]
fn test_later_load_overrides_earlier() {
  let mut store = ConfigStore::new();
  store.load_str("x = 1\n").unwrap();
  store.load_str("x = 2\ny += b\n").unwrap();

  assert_eq!(value(&store, "x"), "2");
  assert_eq!(value(&store, "y"), "b");
}
