use super::{repository::RepositoryConfig, rules::BranchRuleSet};
use crate::{error::Error, git::types::BranchRef};

pub const IMPORTING_NOTICE: &str = "Branch status is unavailable while the repository is still importing.";

/// A summary value; emphasized values are computed fallbacks rather than configured text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryValue {
  pub text: String,
  pub emphasized: bool,
}

impl SummaryValue {
  fn configured(text: impl Into<String>) -> Self {
    SummaryValue { text: text.into(), emphasized: false }
  }

  fn fallback(text: impl Into<String>) -> Self {
    SummaryValue { text: text.into(), emphasized: true }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSummary {
  pub default_branch: SummaryValue,
  pub track_only: SummaryValue,
  pub autoclose_only: SummaryValue,
}

impl PanelSummary {
  pub fn properties(&self) -> [(&'static str, &SummaryValue); 3] {
    [("Default Branch", &self.default_branch), ("Track Only", &self.track_only), ("Autoclose Only", &self.autoclose_only)]
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocloseStatus {
  On,
  Off,
  DisabledByRepository,
}

impl AutocloseStatus {
  pub fn label(&self) -> &'static str {
    match self {
      AutocloseStatus::On => "Autoclose On",
      AutocloseStatus::Off => "Off",
      AutocloseStatus::DisabledByRepository => "Disabled (Repository)",
    }
  }
}

/// One computed row of the branch status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStatusRow {
  pub is_default: bool,
  pub name: String,
  pub is_closed: bool,
  pub tracking: bool,
  pub autoclose: AutocloseStatus,
}

impl BranchStatusRow {
  pub fn status_label(&self) -> &'static str {
    if self.is_closed { "Closed" } else { "Open" }
  }

  pub fn track_label(&self) -> &'static str {
    if self.tracking { "Tracking" } else { "Off" }
  }

  pub fn autoclose_label(&self) -> &'static str {
    self.autoclose.label()
  }
}

/// What the panel shows below the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
  Table,
  Importing,
  Unsupported,
}

/// Branch tracking and autoclose view of a repository.
#[derive(Debug, Clone)]
pub struct BranchPanel {
  config: RepositoryConfig,
  track_only: BranchRuleSet,
  autoclose_only: BranchRuleSet,
}

impl BranchPanel {
  pub fn new(config: RepositoryConfig) -> Result<Self, Error> {
    let track_only = BranchRuleSet::parse(&config.track_only)?;
    let autoclose_only = BranchRuleSet::parse(&config.autoclose_only)?;
    Ok(BranchPanel { config, track_only, autoclose_only })
  }

  pub fn config(&self) -> &RepositoryConfig {
    &self.config
  }

  pub fn has_branch_configuration(&self) -> bool {
    self.config.has_branch_configuration()
  }

  pub fn table_state(&self) -> TableState {
    if !self.config.vcs.supports_branches() {
      TableState::Unsupported
    } else if self.config.importing {
      TableState::Importing
    } else {
      TableState::Table
    }
  }

  /// Only state in which the branch query should be issued.
  pub fn should_query(&self) -> bool {
    self.table_state() == TableState::Table
  }

  pub fn status_column_visible(&self) -> bool {
    self.config.vcs.can_close_branches()
  }

  pub fn summary(&self) -> PanelSummary {
    let default_branch = match self.config.default_branch_override() {
      Some(name) => SummaryValue::configured(name),
      None => SummaryValue::fallback(self.config.resolved_default_branch()),
    };

    let track_only = if self.track_only.is_empty() {
      SummaryValue::fallback("Track All Branches")
    } else {
      SummaryValue::configured(self.track_only.display())
    };

    let autoclose_only = if self.config.disable_autoclose {
      SummaryValue::fallback("Autoclose has been disabled")
    } else if self.autoclose_only.is_empty() {
      SummaryValue::fallback("Autoclose On All Branches")
    } else {
      SummaryValue::configured(self.autoclose_only.display())
    };

    PanelSummary { default_branch, track_only, autoclose_only }
  }

  pub fn should_track_branch(&self, branch_name: &str) -> bool {
    self.track_only.selects(branch_name)
  }

  pub fn autoclose_status(&self, branch_name: &str) -> AutocloseStatus {
    if self.config.disable_autoclose {
      AutocloseStatus::DisabledByRepository
    } else if self.autoclose_only.selects(branch_name) {
      AutocloseStatus::On
    } else {
      AutocloseStatus::Off
    }
  }

  pub fn branch_row(&self, branch: &BranchRef) -> BranchStatusRow {
    let name = branch.short_name.clone();
    BranchStatusRow {
      is_default: name == self.config.resolved_default_branch(),
      is_closed: branch.is_closed(),
      tracking: self.should_track_branch(&name),
      autoclose: self.autoclose_status(&name),
      name,
    }
  }

  pub fn rows(&self, branches: &[BranchRef]) -> Vec<BranchStatusRow> {
    branches.iter().map(|branch| self.branch_row(branch)).collect()
  }
}
