use async_trait::async_trait;
use serde_json::Value;

use super::{BranchQueryService, BranchRef};
use crate::error::Error;

#[derive(Clone, Debug)]
pub struct MockBranchQuery {
  pub repository: String,
  pub branches: Vec<BranchRef>,
  pub fail_from_offset: Option<usize>,
}

impl MockBranchQuery {
  pub fn with_names(names: &[&str]) -> Self {
    MockBranchQuery {
      repository: "mock".to_string(),
      branches: names.iter().map(|name| BranchRef::new(name.to_string())).collect(),
      fail_from_offset: None,
    }
  }

  /// Lists the first pages normally and fails for any offset at or past `offset`.
  pub fn failing_from(names: &[&str], offset: usize) -> Self {
    MockBranchQuery { fail_from_offset: Some(offset), ..MockBranchQuery::with_names(names) }
  }

  /// A query whose every listing fails.
  pub fn failing() -> Self {
    MockBranchQuery { repository: "should fail".to_string(), ..Default::default() }
  }
}

impl Default for MockBranchQuery {
  fn default() -> Self {
    MockBranchQuery {
      repository: "mock".to_string(),
      branches: vec![
        BranchRef::new("main".to_string()),
        BranchRef::new("old-stable".to_string()).with_field("closed", Value::Bool(true)),
        BranchRef::new("release/1.0".to_string()),
      ],
      fail_from_offset: None,
    }
  }
}

#[async_trait]
impl BranchQueryService for MockBranchQuery {
  fn repository_id(&self) -> String {
    self.repository.clone()
  }

  async fn list_branches(&self, repository: &str, offset: usize, limit: usize) -> Result<Vec<BranchRef>, Error> {
    match repository {
      "should fail" => Err(Error::Git("Branch query failed".to_string())),
      _ if self.fail_from_offset.is_some_and(|fail_from| offset >= fail_from) => {
        Err(Error::Git("Branch query failed".to_string()))
      },
      _ => Ok(self.branches.iter().skip(offset).take(limit).cloned().collect()),
    }
  }
}
