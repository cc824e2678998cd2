use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
  #[default]
  #[strum(to_string = "Git")]
  Git,
  #[strum(to_string = "Mercurial")]
  Hg,
  #[strum(to_string = "Subversion")]
  Svn,
}

impl VcsKind {
  /// Branch used when the repository does not override its default branch.
  pub fn default_branch_name(&self) -> Option<&'static str> {
    match self {
      VcsKind::Git => Some("master"),
      VcsKind::Hg => Some("default"),
      VcsKind::Svn => None,
    }
  }

  pub fn supports_branches(&self) -> bool {
    matches!(self, VcsKind::Git | VcsKind::Hg)
  }

  pub fn can_close_branches(&self) -> bool {
    matches!(self, VcsKind::Hg)
  }
}

/// Branch related settings of a hosted repository.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
  #[serde(default)]
  pub default_branch: Option<String>,
  #[serde(default)]
  pub track_only: Vec<String>,
  #[serde(default)]
  pub autoclose_only: Vec<String>,
  #[serde(default)]
  pub disable_autoclose: bool,
  #[serde(default)]
  pub importing: bool,
  #[serde(default)]
  pub vcs: VcsKind,
}

impl RepositoryConfig {
  /// The configured override, ignoring blank values.
  pub fn default_branch_override(&self) -> Option<&str> {
    self.default_branch.as_deref().map(str::trim).filter(|name| !name.is_empty())
  }

  pub fn resolved_default_branch(&self) -> &str {
    self.default_branch_override().or(self.vcs.default_branch_name()).unwrap_or_default()
  }

  pub fn has_branch_configuration(&self) -> bool {
    self.default_branch_override().is_some() || !self.track_only.is_empty() || !self.autoclose_only.is_empty()
  }
}
