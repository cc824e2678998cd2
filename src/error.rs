use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Git2(#[from] git2::Error),
  #[error("{0}")]
  Git(String),
  #[error(transparent)]
  Utf8(#[from] std::string::FromUtf8Error),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error("unknown trigger rule type \"{0}\"")]
  UnknownRuleType(String),
  #[error("invalid branch rule \"{rule}\": {source}")]
  InvalidBranchRule {
    rule: String,
    #[source]
    source: regex::Error,
  },
  #[error("failed to parse trigger rules: {0}")]
  RuleParse(#[from] json5::Error),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}
