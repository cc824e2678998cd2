use std::{env::current_dir, path::PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command as TokioCommand;
use tracing::{error, info};

use crate::{
  error::Error,
  git::types::{BranchQueryService, BranchRef},
};

const BRANCH_FORMAT: &str = "%(HEAD)%09%(refname:short)%09%(objectname)%09%(upstream:short)";

pub struct GitCliRepo {
  path: PathBuf,
}

impl GitCliRepo {
  pub fn from_cwd() -> Result<GitCliRepo, Error> {
    Ok(GitCliRepo { path: current_dir()? })
  }
}

async fn run_git_command(args: &[&str]) -> Result<String, Error> {
  let args_log_command = args.join(" ");
  info!("Running `git {}`", args_log_command);
  let output = match TokioCommand::new("git").args(args).output().await {
    Ok(output) => output,
    Err(err) => {
      error!("Failed to run `git {}`, error: {}", args_log_command, err);
      return Err(Error::Git(format!("{}", err)));
    },
  };

  let err = String::from_utf8(output.stderr)?;
  if !output.status.success() && !err.is_empty() {
    error!("Failed to run `git {}`, error: {}", args_log_command, err);
    return Err(Error::Git(err));
  }
  let content = String::from_utf8(output.stdout)?;
  info!("Received git cli reply:\n{}", content);
  Ok(content)
}

// One line per branch, tab separated:
// *	main	8fb5d9b1...	origin/main
//  	stash-list	6442450f...
fn parse_branch_line(line: &str) -> Option<BranchRef> {
  let mut parts = line.split('\t');
  let head = parts.next()?;
  let name = parts.next().filter(|name| !name.is_empty())?;
  let mut branch_ref = BranchRef::new(name.to_string()).with_field("closed", Value::Bool(false));
  if let Some(commit) = parts.next().filter(|commit| !commit.is_empty()) {
    branch_ref = branch_ref.with_commit(commit.to_string());
  }
  if head.trim() == "*" {
    branch_ref = branch_ref.with_field("head", Value::Bool(true));
  }
  if let Some(upstream) = parts.next().map(str::trim).filter(|upstream| !upstream.is_empty()) {
    branch_ref = branch_ref.with_field("upstream", Value::String(upstream.to_string()));
  }
  Some(branch_ref)
}

#[async_trait]
impl BranchQueryService for GitCliRepo {
  fn repository_id(&self) -> String {
    self.path.display().to_string()
  }

  async fn list_branches(&self, repository: &str, offset: usize, limit: usize) -> Result<Vec<BranchRef>, Error> {
    info!("Listing branches for {} (offset {}, limit {})", repository, offset, limit);
    let format = format!("--format={}", BRANCH_FORMAT);
    let res = run_git_command(&["for-each-ref", "--sort=refname", &format, "refs/heads"]).await?;

    let branches: Vec<BranchRef> = res
      .lines()
      .filter_map(|line| {
        let parsed = parse_branch_line(line);
        if parsed.is_none() {
          error!("Failed to capture git branch information for: {}", line);
        }
        parsed
      })
      .skip(offset)
      .take(limit)
      .collect();

    Ok(branches)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn test_parse_head_branch_with_upstream() {
    let branch = parse_branch_line("*\tmain\t8fb5d9b\torigin/main").unwrap();

    assert_eq!(branch.short_name, "main");
    assert_eq!(branch.commit_identifier, Some("8fb5d9b".to_string()));
    assert_eq!(branch.raw_fields.get("upstream"), Some(&Value::String("origin/main".to_string())));
    assert_eq!(branch.raw_fields.get("head"), Some(&Value::Bool(true)));
    assert!(!branch.is_closed());
  }

  #[test]
  fn test_parse_branch_without_upstream() {
    let branch = parse_branch_line(" \tfeature/x\t6442450\t").unwrap();

    assert_eq!(branch.short_name, "feature/x");
    assert_eq!(branch.raw_fields.get("upstream"), None);
    assert_eq!(branch.raw_fields.get("head"), None);
  }

  #[test]
  fn test_parse_garbage_line() {
    assert_eq!(parse_branch_line("garbage"), None);
  }
}
