use crossterm::event::KeyEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{
  control::{ElementId, ValueControl},
  rule_type::RuleTypeRegistry,
};
use crate::error::Error;

fn default_true() -> bool {
  true
}

/// Hydration payload of a rule row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDictionary {
  #[serde(rename = "type", default)]
  pub rule_type: Option<String>,
  #[serde(default)]
  pub value: Value,
  #[serde(rename = "isValidRule", default = "default_true")]
  pub is_valid_rule: bool,
  #[serde(rename = "invalidView", default)]
  pub invalid_view: Option<String>,
}

/// Submission payload of a rule row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSubmission {
  #[serde(rename = "type")]
  pub rule_type: Option<String>,
  pub value: Value,
}

/// State of one rule, handed to control factories as the control's owner.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerRule {
  pub row_id: Option<String>,
  pub rule_type: Option<String>,
  pub value: Value,
  pub is_valid_rule: bool,
  pub invalid_view: Option<String>,
}

impl Default for TriggerRule {
  fn default() -> Self {
    TriggerRule { row_id: None, rule_type: None, value: Value::Null, is_valid_rule: true, invalid_view: None }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeOption {
  pub type_key: String,
  pub display_name: String,
}

/// The type dropdown: selectable types as options plus the current selection,
/// which is set directly and may name a type that is not an option.
#[derive(Debug, Clone)]
pub struct TypeSelector {
  options: Vec<TypeOption>,
  selected: Option<String>,
  selected_label: String,
}

impl TypeSelector {
  fn new(registry: &RuleTypeRegistry, selected: Option<&str>) -> Self {
    let options = registry
      .selectable_types()
      .map(|rule_type| TypeOption {
        type_key: rule_type.type_key().to_string(),
        display_name: rule_type.display_name().to_string(),
      })
      .collect();
    let mut selector = TypeSelector { options, selected: None, selected_label: String::new() };
    if let Some(selected) = selected {
      selector.set_selected(registry, selected);
    }
    selector
  }

  fn set_selected(&mut self, registry: &RuleTypeRegistry, type_key: &str) {
    self.selected = Some(type_key.to_string());
    self.selected_label = registry
      .get_type(type_key)
      .map(|rule_type| rule_type.display_name().to_string())
      .unwrap_or_else(|_| type_key.to_string());
  }

  pub fn options(&self) -> &[TypeOption] {
    &self.options
  }

  pub fn selected(&self) -> Option<&str> {
    self.selected.as_deref()
  }

  pub fn selected_label(&self) -> &str {
    &self.selected_label
  }

  fn selected_position(&self) -> Option<usize> {
    let selected = self.selected.as_deref()?;
    self.options.iter().position(|option| option.type_key == selected)
  }

  pub fn next_option(&self) -> Option<&str> {
    let next = match self.selected_position() {
      Some(position) => (position + 1) % self.options.len(),
      None => 0,
    };
    self.options.get(next).map(|option| option.type_key.as_str())
  }

  pub fn previous_option(&self) -> Option<&str> {
    let count = self.options.len();
    let previous = match self.selected_position() {
      Some(position) => (position + count - 1) % count,
      None => count.checked_sub(1)?,
    };
    self.options.get(previous).map(|option| option.type_key.as_str())
  }
}

pub struct TypeCell {
  id: ElementId,
  selector: TypeSelector,
}

impl TypeCell {
  pub fn id(&self) -> ElementId {
    self.id
  }

  pub fn selector(&self) -> &TypeSelector {
    &self.selector
  }
}

pub struct ValueCell {
  id: ElementId,
  control: Option<Box<dyn ValueControl>>,
}

impl ValueCell {
  pub fn id(&self) -> ElementId {
    self.id
  }

  pub fn control(&self) -> Option<&dyn ValueControl> {
    self.control.as_deref()
  }

  pub fn control_id(&self) -> Option<ElementId> {
    self.control().map(|control| control.id())
  }
}

/// Placeholder shown across both columns of an invalid rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCell {
  pub markup: String,
}

impl InvalidCell {
  pub const COLUMN_SPAN: u16 = 2;
}

pub enum RowCell<'a> {
  Type(&'a TypeCell),
  Value(&'a ValueCell),
  Invalid(InvalidCell),
}

struct RowCells {
  type_cell: TypeCell,
  value_cell: ValueCell,
}

impl RowCells {
  fn new(registry: &RuleTypeRegistry, selected: Option<&str>) -> Self {
    RowCells {
      type_cell: TypeCell { id: ElementId::next(), selector: TypeSelector::new(registry, selected) },
      value_cell: ValueCell { id: ElementId::next(), control: None },
    }
  }
}

/// One editable `(type, value)` row of a trigger rule editor.
///
/// Cells are created on the first render and reused afterwards. The value control is
/// rebuilt on every render and every type change, and the row's value is only pulled
/// out of the control when the row is submitted.
pub struct TriggerRuleRow {
  rule: TriggerRule,
  cells: Option<RowCells>,
}

impl Default for TriggerRuleRow {
  fn default() -> Self {
    Self::new()
  }
}

impl TriggerRuleRow {
  pub fn new() -> Self {
    TriggerRuleRow { rule: TriggerRule::default(), cells: None }
  }

  /// Hydrates a row without checking the type against any registry.
  pub fn from_dictionary(dictionary: RuleDictionary) -> Self {
    let rule = TriggerRule {
      row_id: None,
      rule_type: dictionary.rule_type,
      value: dictionary.value,
      is_valid_rule: dictionary.is_valid_rule,
      invalid_view: dictionary.invalid_view,
    };
    TriggerRuleRow { rule, cells: None }
  }

  pub fn with_row_id(mut self, row_id: impl Into<String>) -> Self {
    self.rule.row_id = Some(row_id.into());
    self
  }

  pub fn with_type(mut self, type_key: impl Into<String>) -> Self {
    self.rule.rule_type = Some(type_key.into());
    self
  }

  pub fn with_value(mut self, value: Value) -> Self {
    self.rule.value = value;
    self
  }

  pub fn rule(&self) -> &TriggerRule {
    &self.rule
  }

  pub fn is_valid_rule(&self) -> bool {
    self.rule.is_valid_rule
  }

  /// A valid row whose cells have not been rendered yet.
  pub fn needs_render(&self) -> bool {
    self.rule.is_valid_rule && self.cells.is_none()
  }

  fn invalid_cell(&self) -> RowCell<'_> {
    RowCell::Invalid(InvalidCell { markup: self.rule.invalid_view.clone().unwrap_or_default() })
  }

  /// Renders the row, rebuilding the value control for the current type.
  pub fn render_row_cells(&mut self, registry: &RuleTypeRegistry) -> Result<Vec<RowCell<'_>>, Error> {
    if !self.rule.is_valid_rule {
      return Ok(vec![self.invalid_cell()]);
    }

    let rule = &self.rule;
    let cells = self.cells.get_or_insert_with(|| RowCells::new(registry, rule.rule_type.as_deref()));
    rebuild_value_control(registry, rule, &mut cells.value_cell)?;

    let cells = &*cells;
    Ok(vec![RowCell::Type(&cells.type_cell), RowCell::Value(&cells.value_cell)])
  }

  /// Cells as last rendered, without touching the value control.
  pub fn cells(&self) -> Vec<RowCell<'_>> {
    if !self.rule.is_valid_rule {
      return vec![self.invalid_cell()];
    }
    match &self.cells {
      Some(cells) => vec![RowCell::Type(&cells.type_cell), RowCell::Value(&cells.value_cell)],
      None => vec![],
    }
  }

  pub fn type_cell(&self) -> Option<&TypeCell> {
    self.cells.as_ref().map(|cells| &cells.type_cell)
  }

  pub fn value_cell(&self) -> Option<&ValueCell> {
    self.cells.as_ref().map(|cells| &cells.value_cell)
  }

  /// Commits a type selection and swaps in a fresh control for it, even when the
  /// selected type is the current one.
  pub fn on_type_change(&mut self, registry: &RuleTypeRegistry, type_key: &str) -> Result<(), Error> {
    if !self.rule.is_valid_rule {
      return Ok(());
    }
    debug!("Rule {:?} changed type to {}", self.rule.row_id, type_key);
    self.rule.rule_type = Some(type_key.to_string());

    let rule = &self.rule;
    if let Some(cells) = self.cells.as_mut() {
      cells.type_cell.selector.set_selected(registry, type_key);
      rebuild_value_control(registry, rule, &mut cells.value_cell)?;
    }
    Ok(())
  }

  pub fn select_next_type(&mut self, registry: &RuleTypeRegistry) -> Result<bool, Error> {
    let next = self.type_cell().and_then(|cell| cell.selector.next_option()).map(str::to_string);
    match next {
      Some(type_key) => self.on_type_change(registry, &type_key).map(|_| true),
      None => Ok(false),
    }
  }

  pub fn select_previous_type(&mut self, registry: &RuleTypeRegistry) -> Result<bool, Error> {
    let previous = self.type_cell().and_then(|cell| cell.selector.previous_option()).map(str::to_string);
    match previous {
      Some(type_key) => self.on_type_change(registry, &type_key).map(|_| true),
      None => Ok(false),
    }
  }

  /// Forwards a key to the active value control. Invalid rows ignore input.
  pub fn handle_value_key(&mut self, key: KeyEvent) -> bool {
    if !self.rule.is_valid_rule {
      return false;
    }
    match self.cells.as_mut().and_then(|cells| cells.value_cell.control.as_mut()) {
      Some(control) => control.handle_key_event(key),
      None => false,
    }
  }

  fn read_value_from_control(&mut self) {
    if let Some(control) = self.cells.as_ref().and_then(|cells| cells.value_cell.control.as_deref()) {
      self.rule.value = control.read();
    }
  }

  /// Pulls the value out of the active control and returns the `{type, value}` payload.
  pub fn submission_value(&mut self) -> RuleSubmission {
    self.read_value_from_control();
    RuleSubmission { rule_type: self.rule.rule_type.clone(), value: self.rule.value.clone() }
  }
}

fn rebuild_value_control(
  registry: &RuleTypeRegistry,
  owner: &TriggerRule,
  value_cell: &mut ValueCell,
) -> Result<(), Error> {
  let type_key = owner.rule_type.as_deref().unwrap_or_default();
  let rule_type = registry.get_type(type_key)?;
  let control = rule_type.new_input_control(owner);
  debug!("Built control {:?} for rule type {}", control.id(), type_key);
  value_cell.control = Some(control);
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use crossterm::event::{KeyCode, KeyModifiers};
  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;
  use crate::trigger::{
    control::{StaticControl, TextControl, ToggleControl},
    rule_type::StaticRuleType,
  };

  fn text_control(owner: &TriggerRule) -> Box<dyn ValueControl> {
    Box::new(TextControl::new(&owner.value))
  }

  fn toggle_control(owner: &TriggerRule) -> Box<dyn ValueControl> {
    Box::new(ToggleControl::new(&owner.value))
  }

  fn static_control(owner: &TriggerRule) -> Box<dyn ValueControl> {
    Box::new(StaticControl::new("Legacy", owner.value.clone()))
  }

  // Three types, two of them selectable.
  fn registry() -> RuleTypeRegistry {
    let mut registry = RuleTypeRegistry::new();
    registry.register(Arc::new(StaticRuleType::new("assign", "Assign to", text_control)));
    registry.register(Arc::new(StaticRuleType::new("legacy", "Legacy effect", static_control).hidden()));
    registry.register(Arc::new(StaticRuleType::new("subscribe", "Subscribe", toggle_control)));
    registry
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn invalid_dictionary() -> RuleDictionary {
    RuleDictionary {
      rule_type: Some("assign".to_string()),
      value: json!("bob"),
      is_valid_rule: false,
      invalid_view: Some("Rule references a deleted user.".to_string()),
    }
  }

  #[test]
  fn test_new_row_is_empty_and_valid() {
    let row = TriggerRuleRow::new();

    assert_eq!(row.rule(), &TriggerRule::default());
    assert!(row.is_valid_rule());
    assert!(row.needs_render());
  }

  #[test]
  fn test_dictionary_defaults() {
    let dictionary: RuleDictionary = serde_json::from_value(json!({"type": "assign", "value": "alice"})).unwrap();

    assert!(dictionary.is_valid_rule);
    assert_eq!(dictionary.invalid_view, None);
  }

  #[test]
  fn test_invalid_row_renders_single_placeholder_cell() {
    let mut row = TriggerRuleRow::from_dictionary(invalid_dictionary());

    let cells = row.render_row_cells(&registry()).unwrap();

    assert_eq!(cells.len(), 1);
    match &cells[0] {
      RowCell::Invalid(cell) => assert_eq!(cell.markup, "Rule references a deleted user."),
      _ => panic!("expected an invalid cell"),
    }
    assert_eq!(InvalidCell::COLUMN_SPAN, 2);
  }

  #[test]
  fn test_invalid_row_ignores_interaction() {
    let registry = registry();
    let mut row = TriggerRuleRow::from_dictionary(invalid_dictionary());

    row.render_row_cells(&registry).unwrap();
    assert!(!row.handle_value_key(key(KeyCode::Char('x'))));
    assert!(!row.select_next_type(&registry).unwrap());
    row.on_type_change(&registry, "subscribe").unwrap();

    assert_eq!(row.submission_value(), RuleSubmission { rule_type: Some("assign".to_string()), value: json!("bob") });
    assert!(row.type_cell().is_none());
  }

  #[test]
  fn test_valid_row_renders_type_and_value_cells() {
    let mut row = TriggerRuleRow::new().with_type("assign").with_value(json!("alice"));

    let cells = row.render_row_cells(&registry()).unwrap();

    assert_eq!(cells.len(), 2);
    assert!(matches!(cells[0], RowCell::Type(_)));
    assert!(matches!(cells[1], RowCell::Value(cell) if cell.control_id().is_some()));
  }

  #[test]
  fn test_render_memoizes_cells() {
    let registry = registry();
    let mut row = TriggerRuleRow::new().with_type("assign");

    row.render_row_cells(&registry).unwrap();
    let type_id = row.type_cell().unwrap().id();
    let value_id = row.value_cell().unwrap().id();
    row.render_row_cells(&registry).unwrap();

    assert_eq!(row.type_cell().unwrap().id(), type_id);
    assert_eq!(row.value_cell().unwrap().id(), value_id);
    assert!(!row.needs_render());
  }

  #[test]
  fn test_type_change_builds_new_control() {
    let registry = registry();
    let mut row = TriggerRuleRow::new().with_type("assign").with_value(json!("alice"));
    row.render_row_cells(&registry).unwrap();
    let value_id = row.value_cell().unwrap().id();
    let first_control = row.value_cell().unwrap().control_id();

    row.on_type_change(&registry, "subscribe").unwrap();

    assert_ne!(row.value_cell().unwrap().control_id(), first_control);
    assert_eq!(row.value_cell().unwrap().id(), value_id);
    assert_eq!(row.type_cell().unwrap().selector().selected(), Some("subscribe"));
    assert_eq!(row.submission_value().rule_type, Some("subscribe".to_string()));
  }

  #[test]
  fn test_reselecting_same_type_rebuilds_control() {
    let registry = registry();
    let mut row = TriggerRuleRow::new().with_type("assign").with_value(json!("alice"));
    row.render_row_cells(&registry).unwrap();
    row.handle_value_key(key(KeyCode::Char('!')));
    let first_control = row.value_cell().unwrap().control_id();

    row.on_type_change(&registry, "assign").unwrap();

    assert_ne!(row.value_cell().unwrap().control_id(), first_control);
    assert_eq!(row.submission_value().value, json!("alice"));
  }

  #[test]
  fn test_submission_pulls_from_control() {
    let registry = registry();
    let mut row = TriggerRuleRow::new().with_type("assign").with_value(json!("al"));
    row.render_row_cells(&registry).unwrap();

    row.handle_value_key(key(KeyCode::Char('i')));

    assert_eq!(row.rule().value, json!("al"));
    assert_eq!(row.submission_value(), RuleSubmission { rule_type: Some("assign".to_string()), value: json!("ali") });
    assert_eq!(row.rule().value, json!("ali"));
  }

  #[test]
  fn test_submission_without_render_returns_constructed_value() {
    let mut row = TriggerRuleRow::new().with_type("assign").with_value(json!({"user": "alice"}));

    assert_eq!(
      row.submission_value(),
      RuleSubmission { rule_type: Some("assign".to_string()), value: json!({"user": "alice"}) }
    );
  }

  #[test]
  fn test_unknown_type_fails_render() {
    let mut row = TriggerRuleRow::from_dictionary(RuleDictionary {
      rule_type: Some("teleport".to_string()),
      value: Value::Null,
      is_valid_rule: true,
      invalid_view: None,
    });

    let result = row.render_row_cells(&registry());

    assert!(matches!(result, Err(Error::UnknownRuleType(key)) if key == "teleport"));
  }

  #[test]
  fn test_selector_offers_only_selectable_types() {
    let mut row = TriggerRuleRow::new().with_type("legacy").with_value(json!(7));
    row.render_row_cells(&registry()).unwrap();

    let selector = row.type_cell().unwrap().selector();
    let options: Vec<&str> = selector.options().iter().map(|option| option.type_key.as_str()).collect();

    assert_eq!(options, vec!["assign", "subscribe"]);
    assert_eq!(selector.selected(), Some("legacy"));
    assert_eq!(selector.selected_label(), "Legacy effect");
  }

  #[test]
  fn test_non_selectable_type_keeps_value_until_changed() {
    let registry = registry();
    let mut row = TriggerRuleRow::new().with_type("legacy").with_value(json!(7));
    row.render_row_cells(&registry).unwrap();

    assert_eq!(row.submission_value().value, json!(7));

    assert!(row.select_next_type(&registry).unwrap());
    assert_eq!(row.rule().rule_type, Some("assign".to_string()));
  }

  #[test]
  fn test_type_cycling_wraps() {
    let registry = registry();
    let mut row = TriggerRuleRow::new().with_type("assign");
    row.render_row_cells(&registry).unwrap();

    row.select_previous_type(&registry).unwrap();
    assert_eq!(row.rule().rule_type, Some("subscribe".to_string()));
    row.select_next_type(&registry).unwrap();
    assert_eq!(row.rule().rule_type, Some("assign".to_string()));
  }

  #[test]
  fn test_cells_do_not_rebuild_control() {
    let registry = registry();
    let mut row = TriggerRuleRow::new().with_type("assign");
    assert!(row.cells().is_empty());
    row.render_row_cells(&registry).unwrap();
    let control = row.value_cell().unwrap().control_id();

    let cells = row.cells();

    assert_eq!(cells.len(), 2);
    assert_eq!(row.value_cell().unwrap().control_id(), control);
  }
}
