use std::{
  env::current_dir,
  path::PathBuf,
  sync::{Mutex, MutexGuard},
};

use git2::{Branch, BranchType, Repository};
use serde_json::Value;
use tracing::{error, info};

use crate::{
  error::Error,
  git::types::{BranchQueryService, BranchRef},
};

pub struct Git2Repo {
  path: PathBuf,
  repo: Mutex<Repository>,
}

impl Git2Repo {
  pub fn from_cwd() -> Result<Git2Repo, Error> {
    let path_buf = current_dir()?;
    let repo = Repository::discover(path_buf.as_path())?;
    let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
    info!("Opened repository at {}", path.display());
    Ok(Git2Repo { path, repo: Mutex::new(repo) })
  }

  fn repo(&self) -> Result<MutexGuard<'_, Repository>, Error> {
    self.repo.lock().map_err(|_| Error::Git("Repository lock was poisoned".to_string()))
  }
}

fn create_branch_ref(result: Result<(Branch, BranchType), git2::Error>) -> Option<BranchRef> {
  let (branch, _branch_type) = result.ok()?;
  let name = branch.name().ok()??;
  let mut branch_ref = BranchRef::new(String::from(name)).with_field("closed", Value::Bool(false));
  if let Some(oid) = branch.get().target() {
    branch_ref = branch_ref.with_commit(oid.to_string());
  }
  if branch.is_head() {
    branch_ref = branch_ref.with_field("head", Value::Bool(true));
  }
  if let Some(upstream) = extract_upstream_name(&branch) {
    branch_ref = branch_ref.with_field("upstream", Value::String(upstream));
  }
  Some(branch_ref)
}

fn extract_upstream_name(local_branch: &Branch) -> Option<String> {
  let upstream_branch = local_branch.upstream().ok()?;
  let upstream_name = upstream_branch.name().ok()??;
  Some(String::from(upstream_name))
}

#[async_trait::async_trait]
impl BranchQueryService for Git2Repo {
  fn repository_id(&self) -> String {
    self.path.display().to_string()
  }

  async fn list_branches(&self, repository: &str, offset: usize, limit: usize) -> Result<Vec<BranchRef>, Error> {
    info!("Listing branches for {} (offset {}, limit {})", repository, offset, limit);
    let repo = self.repo()?;
    let branches = match repo.branches(Some(BranchType::Local)) {
      Ok(branches) => branches,
      Err(err) => {
        error!("Failed to list branches: {}", err);
        return Err(Error::Git2(err));
      },
    };
    let mut loaded: Vec<BranchRef> = branches.filter_map(create_branch_ref).collect();
    loaded.sort_by(|a, b| a.short_name.cmp(&b.short_name));
    Ok(loaded.into_iter().skip(offset).take(limit).collect())
  }
}
