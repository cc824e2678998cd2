use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// A branch reference as returned by a branch query.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRef {
  pub short_name: String,
  #[serde(default)]
  pub commit_identifier: Option<String>,
  #[serde(default)]
  pub raw_fields: Map<String, Value>,
}

impl BranchRef {
  pub fn new(short_name: String) -> Self {
    BranchRef { short_name, commit_identifier: None, raw_fields: Map::new() }
  }

  pub fn with_commit(mut self, commit: String) -> Self {
    self.commit_identifier = Some(commit);
    self
  }

  pub fn with_field(mut self, key: &str, value: Value) -> Self {
    self.raw_fields.insert(key.to_string(), value);
    self
  }

  pub fn is_closed(&self) -> bool {
    self.raw_fields.get("closed").and_then(Value::as_bool).unwrap_or(false)
  }
}

#[async_trait::async_trait]
pub trait BranchQueryService: Send + Sync {
  /// Identifier of the repository this service answers for.
  fn repository_id(&self) -> String;

  /// Lists branches ordered by name, starting at `offset` and returning at most `limit` refs.
  async fn list_branches(&self, repository: &str, offset: usize, limit: usize) -> Result<Vec<BranchRef>, Error>;
}
