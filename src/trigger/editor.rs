use std::{fs, io::ErrorKind, path::Path, sync::Arc};

use serde_json::Value;
use tracing::{info, warn};

use super::{
  row::{RuleDictionary, RuleSubmission, TriggerRuleRow},
  rule_type::RuleTypeRegistry,
};
use crate::error::Error;

/// Editable list of trigger rules sharing one type registry.
pub struct TriggerRuleEditor {
  registry: Arc<RuleTypeRegistry>,
  rows: Vec<TriggerRuleRow>,
  next_row_id: usize,
}

impl TriggerRuleEditor {
  pub fn new(registry: Arc<RuleTypeRegistry>) -> Self {
    TriggerRuleEditor { registry, rows: vec![], next_row_id: 1 }
  }

  /// Hydrates rows from dictionaries. Rows whose type is not registered are kept as
  /// invalid rows so their data survives a save.
  pub fn from_dictionaries(registry: Arc<RuleTypeRegistry>, dictionaries: Vec<RuleDictionary>) -> Self {
    let mut editor = Self::new(registry);
    for mut dictionary in dictionaries {
      let type_key = dictionary.rule_type.clone().unwrap_or_default();
      if dictionary.is_valid_rule && !editor.registry.contains(&type_key) {
        warn!("Rule type {:?} is not registered", type_key);
        dictionary.is_valid_rule = false;
        dictionary.invalid_view.get_or_insert_with(|| format!("Unknown rule type \"{}\".", type_key));
      }
      editor.push_row(TriggerRuleRow::from_dictionary(dictionary));
    }
    editor
  }

  /// Reads a JSON5 array of rule dictionaries. A missing file gives an empty editor.
  pub fn load(registry: Arc<RuleTypeRegistry>, path: &Path) -> Result<Self, Error> {
    let contents = match fs::read_to_string(path) {
      Ok(contents) => contents,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        info!("No rules file at {}", path.display());
        return Ok(Self::new(registry));
      },
      Err(e) => return Err(e.into()),
    };
    let values: Vec<Value> = json5::from_str(&contents)?;
    let dictionaries = values.into_iter().map(serde_json::from_value).collect::<Result<Vec<RuleDictionary>, _>>()?;
    info!("Loaded {} rules from {}", dictionaries.len(), path.display());
    Ok(Self::from_dictionaries(registry, dictionaries))
  }

  pub fn registry(&self) -> &RuleTypeRegistry {
    &self.registry
  }

  pub fn rows(&self) -> &[TriggerRuleRow] {
    &self.rows
  }

  pub fn row_mut(&mut self, index: usize) -> Option<&mut TriggerRuleRow> {
    self.rows.get_mut(index)
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  fn push_row(&mut self, row: TriggerRuleRow) {
    let row = row.with_row_id(format!("rule-{}", self.next_row_id));
    self.next_row_id += 1;
    self.rows.push(row);
  }

  /// Appends a row of the default type and renders it. Returns its index.
  pub fn add_row(&mut self) -> Result<usize, Error> {
    let mut row = TriggerRuleRow::new();
    if let Some(type_key) = self.registry.default_type_key() {
      row = row.with_type(type_key);
    }
    self.push_row(row);
    let index = self.rows.len() - 1;
    self.rows[index].render_row_cells(&self.registry)?;
    Ok(index)
  }

  pub fn remove_row(&mut self, index: usize) -> Option<TriggerRuleRow> {
    (index < self.rows.len()).then(|| self.rows.remove(index))
  }

  /// Renders every row that has not been rendered yet.
  pub fn render_pending_rows(&mut self) -> Result<(), Error> {
    for row in self.rows.iter_mut().filter(|row| row.needs_render()) {
      row.render_row_cells(&self.registry)?;
    }
    Ok(())
  }

  /// Moves the row at `index` to the next or previous selectable type.
  pub fn change_type(&mut self, index: usize, forward: bool) -> Result<bool, Error> {
    let Some(row) = self.rows.get_mut(index) else {
      return Ok(false);
    };
    if forward { row.select_next_type(&self.registry) } else { row.select_previous_type(&self.registry) }
  }

  pub fn submission_values(&mut self) -> Vec<RuleSubmission> {
    self.rows.iter_mut().map(|row| row.submission_value()).collect()
  }

  /// Writes the submissions of every row as pretty JSON.
  pub fn save(&mut self, path: &Path) -> Result<(), Error> {
    let submissions = self.submission_values();
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)?;
      }
    }
    fs::write(path, serde_json::to_string_pretty(&submissions)?)?;
    info!("Saved {} rules to {}", submissions.len(), path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;
  use crate::trigger::row::RowCell;

  fn registry() -> Arc<RuleTypeRegistry> {
    Arc::new(RuleTypeRegistry::with_builtin_types())
  }

  fn dictionary(rule_type: &str, value: Value) -> RuleDictionary {
    RuleDictionary { rule_type: Some(rule_type.to_string()), value, is_valid_rule: true, invalid_view: None }
  }

  #[test]
  fn test_unregistered_type_becomes_invalid_row() {
    let mut editor = TriggerRuleEditor::from_dictionaries(registry(), vec![dictionary("teleport", json!("mars"))]);

    editor.render_pending_rows().unwrap();

    let row = &editor.rows()[0];
    assert!(!row.is_valid_rule());
    match &row.cells()[0] {
      RowCell::Invalid(cell) => assert_eq!(cell.markup, "Unknown rule type \"teleport\"."),
      _ => panic!("expected an invalid cell"),
    }
  }

  #[test]
  fn test_invalid_rows_keep_their_submission() {
    let mut editor = TriggerRuleEditor::from_dictionaries(
      registry(),
      vec![dictionary("teleport", json!("mars")), dictionary("status", json!("resolved"))],
    );
    editor.render_pending_rows().unwrap();

    assert_eq!(
      editor.submission_values(),
      vec![
        RuleSubmission { rule_type: Some("teleport".to_string()), value: json!("mars") },
        RuleSubmission { rule_type: Some("status".to_string()), value: json!("resolved") },
      ]
    );
  }

  #[test]
  fn test_add_row_uses_default_type() {
    let mut editor = TriggerRuleEditor::new(registry());

    let index = editor.add_row().unwrap();

    assert_eq!(index, 0);
    assert_eq!(editor.rows()[0].rule().rule_type, Some("status".to_string()));
    assert_eq!(editor.rows()[0].cells().len(), 2);
    assert_eq!(editor.submission_values()[0].value, json!("open"));
  }

  #[test]
  fn test_row_ids_are_unique() {
    let mut editor = TriggerRuleEditor::new(registry());
    editor.add_row().unwrap();
    editor.add_row().unwrap();
    editor.remove_row(0);
    editor.add_row().unwrap();

    let ids: Vec<_> = editor.rows().iter().map(|row| row.rule().row_id.clone().unwrap()).collect();

    assert_eq!(ids, vec!["rule-2".to_string(), "rule-3".to_string()]);
  }

  #[test]
  fn test_remove_out_of_range() {
    let mut editor = TriggerRuleEditor::new(registry());

    assert!(editor.remove_row(3).is_none());
  }

  #[test]
  fn test_change_type_and_edit() {
    let mut editor = TriggerRuleEditor::from_dictionaries(registry(), vec![dictionary("priority", json!("high"))]);
    editor.render_pending_rows().unwrap();

    assert!(editor.change_type(0, true).unwrap());
    let row = editor.row_mut(0).unwrap();
    row.handle_value_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE));

    assert_eq!(
      editor.submission_values()[0],
      RuleSubmission { rule_type: Some("assign".to_string()), value: json!("highx") }
    );
    assert!(!editor.change_type(5, true).unwrap());
  }

  #[test]
  fn test_load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();

    let editor = TriggerRuleEditor::load(registry(), &dir.path().join("rules.json5")).unwrap();

    assert!(editor.is_empty());
  }

  #[test]
  fn test_load_json5_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json5");
    fs::write(
      &path,
      r#"[
        // comments are allowed
        { type: "subscribe", value: true },
        { type: "assign", value: "alice", isValidRule: false, invalidView: "User alice no longer exists." },
      ]"#,
    )
    .unwrap();

    let mut editor = TriggerRuleEditor::load(registry(), &path).unwrap();
    editor.render_pending_rows().unwrap();
    editor.row_mut(0).unwrap().handle_value_key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE));
    editor.save(&path).unwrap();

    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved, json!([{"type": "subscribe", "value": false}, {"type": "assign", "value": "alice"}]));
  }

  #[test]
  fn test_save_keeps_unedited_values_controls_cannot_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json5");
    fs::write(
      &path,
      r#"[
        { type: "status", value: "duplicate" },
        { type: "assign", value: ["alice", "bob"] },
        { type: "subscribe", value: "yes" },
      ]"#,
    )
    .unwrap();

    let mut editor = TriggerRuleEditor::load(registry(), &path).unwrap();
    editor.render_pending_rows().unwrap();
    editor.save(&path).unwrap();

    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
      saved,
      json!([
        {"type": "status", "value": "duplicate"},
        {"type": "assign", "value": ["alice", "bob"]},
        {"type": "subscribe", "value": "yes"},
      ])
    );
  }

  #[test]
  fn test_load_rejects_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json5");
    fs::write(&path, "{ not an array").unwrap();

    assert!(TriggerRuleEditor::load(registry(), &path).is_err());
  }
}
