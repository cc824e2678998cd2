use std::sync::Arc;

use super::{
  control::{ChoiceControl, StaticControl, TextControl, ToggleControl, ValueControl},
  row::TriggerRule,
};
use crate::error::Error;

/// Builds the value control for a rule, reading its initial value from the owning rule.
pub type ControlFactory = fn(&TriggerRule) -> Box<dyn ValueControl>;

pub trait TriggerRuleType: Send + Sync {
  fn type_key(&self) -> &str;

  fn display_name(&self) -> &str;

  /// Whether the type is offered in the type selector.
  fn is_selectable(&self) -> bool {
    true
  }

  fn new_input_control(&self, owner: &TriggerRule) -> Box<dyn ValueControl>;
}

/// A rule type described by data plus a control factory.
#[derive(Clone)]
pub struct StaticRuleType {
  type_key: &'static str,
  display_name: &'static str,
  selectable: bool,
  factory: ControlFactory,
}

impl StaticRuleType {
  pub fn new(type_key: &'static str, display_name: &'static str, factory: ControlFactory) -> Self {
    StaticRuleType { type_key, display_name, selectable: true, factory }
  }

  pub fn hidden(mut self) -> Self {
    self.selectable = false;
    self
  }
}

impl TriggerRuleType for StaticRuleType {
  fn type_key(&self) -> &str {
    self.type_key
  }

  fn display_name(&self) -> &str {
    self.display_name
  }

  fn is_selectable(&self) -> bool {
    self.selectable
  }

  fn new_input_control(&self, owner: &TriggerRule) -> Box<dyn ValueControl> {
    (self.factory)(owner)
  }
}

const STATUS_OPTIONS: &[(&str, &str)] =
  &[("open", "Open"), ("resolved", "Resolved"), ("wontfix", "Wontfix"), ("invalid", "Invalid")];

const PRIORITY_OPTIONS: &[(&str, &str)] = &[
  ("unbreak", "Unbreak Now!"),
  ("triage", "Needs Triage"),
  ("high", "High"),
  ("normal", "Normal"),
  ("low", "Low"),
  ("wish", "Wishlist"),
];

fn status_control(owner: &TriggerRule) -> Box<dyn ValueControl> {
  Box::new(ChoiceControl::new(STATUS_OPTIONS, &owner.value))
}

fn priority_control(owner: &TriggerRule) -> Box<dyn ValueControl> {
  Box::new(ChoiceControl::new(PRIORITY_OPTIONS, &owner.value))
}

fn text_control(owner: &TriggerRule) -> Box<dyn ValueControl> {
  Box::new(TextControl::new(&owner.value))
}

fn toggle_control(owner: &TriggerRule) -> Box<dyn ValueControl> {
  Box::new(ToggleControl::new(&owner.value))
}

fn unknown_control(owner: &TriggerRule) -> Box<dyn ValueControl> {
  Box::new(StaticControl::new("This effect can not be edited.", owner.value.clone()))
}

/// Ordered catalog of the rule types an editor knows about.
#[derive(Clone, Default)]
pub struct RuleTypeRegistry {
  types: Vec<Arc<dyn TriggerRuleType>>,
}

impl RuleTypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_builtin_types() -> Self {
    let mut registry = Self::new();
    registry.register(Arc::new(StaticRuleType::new("status", "Change status to", status_control)));
    registry.register(Arc::new(StaticRuleType::new("priority", "Change priority to", priority_control)));
    registry.register(Arc::new(StaticRuleType::new("assign", "Assign to", text_control)));
    registry.register(Arc::new(StaticRuleType::new("addproject", "Add project tags", text_control)));
    registry.register(Arc::new(StaticRuleType::new("removeproject", "Remove project tags", text_control)));
    registry.register(Arc::new(StaticRuleType::new("subscribe", "Subscribe acting user", toggle_control)));
    registry.register(Arc::new(StaticRuleType::new("unknown", "Unknown effect", unknown_control).hidden()));
    registry
  }

  /// Adds a type, replacing any registered type with the same key in place.
  pub fn register(&mut self, rule_type: Arc<dyn TriggerRuleType>) {
    match self.types.iter().position(|existing| existing.type_key() == rule_type.type_key()) {
      Some(index) => self.types[index] = rule_type,
      None => self.types.push(rule_type),
    }
  }

  pub fn list_types(&self) -> &[Arc<dyn TriggerRuleType>] {
    &self.types
  }

  pub fn get_type(&self, type_key: &str) -> Result<Arc<dyn TriggerRuleType>, Error> {
    self
      .types
      .iter()
      .find(|rule_type| rule_type.type_key() == type_key)
      .cloned()
      .ok_or_else(|| Error::UnknownRuleType(type_key.to_string()))
  }

  pub fn contains(&self, type_key: &str) -> bool {
    self.types.iter().any(|rule_type| rule_type.type_key() == type_key)
  }

  pub fn selectable_types(&self) -> impl Iterator<Item = &Arc<dyn TriggerRuleType>> {
    self.types.iter().filter(|rule_type| rule_type.is_selectable())
  }

  /// Type given to newly added rows.
  pub fn default_type_key(&self) -> Option<&str> {
    self.selectable_types().next().map(|rule_type| rule_type.type_key())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::trigger::row::TriggerRuleRow;

  #[test]
  fn test_builtin_types() {
    let registry = RuleTypeRegistry::with_builtin_types();

    assert_eq!(registry.default_type_key(), Some("status"));
    assert!(registry.contains("unknown"));
    assert!(registry.selectable_types().all(|rule_type| rule_type.type_key() != "unknown"));
  }

  #[test]
  fn test_get_unknown_type() {
    let registry = RuleTypeRegistry::with_builtin_types();

    assert!(matches!(registry.get_type("teleport"), Err(Error::UnknownRuleType(key)) if key == "teleport"));
  }

  #[test]
  fn test_register_replaces_existing_key() {
    let mut registry = RuleTypeRegistry::with_builtin_types();
    let count = registry.list_types().len();

    registry.register(Arc::new(StaticRuleType::new("status", "Set status", text_control)));

    assert_eq!(registry.list_types().len(), count);
    assert_eq!(registry.get_type("status").unwrap().display_name(), "Set status");
    assert_eq!(registry.list_types()[0].type_key(), "status");
  }

  #[test]
  fn test_factory_reads_owner_value() {
    let registry = RuleTypeRegistry::with_builtin_types();
    let row = TriggerRuleRow::new().with_type("priority").with_value(json!("low"));

    let control = registry.get_type("priority").unwrap().new_input_control(row.rule());

    assert_eq!(control.read(), json!("low"));
  }
}
