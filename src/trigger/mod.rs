pub mod control;
pub mod editor;
pub mod row;
pub mod rule_type;

pub use editor::TriggerRuleEditor;
pub use row::{RowCell, RuleDictionary, RuleSubmission, TriggerRule, TriggerRuleRow};
pub use rule_type::{RuleTypeRegistry, StaticRuleType, TriggerRuleType};
