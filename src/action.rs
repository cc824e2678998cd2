use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display, Deserialize)]
pub enum Action {
  AddRule,
  BranchesLoaded,
  ChangeRuleType(bool),
  EditRuleValue,
  EndInputMode,
  Error(String),
  ExitError,
  NextPage,
  PreviousPage,
  Quit,
  Refresh,
  RemoveRule,
  Render,
  Resize(u16, u16),
  Resume,
  SaveRules,
  SelectNext,
  SelectPrevious,
  StartInputMode,
  Suspend,
  Tick,
  ToggleView,
}
