use derive_deref::{Deref, DerefMut};
use regex::{Regex, RegexBuilder};

use crate::error::Error;

const REGEXP_PREFIX: &str = "regexp(";

/// A single track/autoclose rule matched against branch names.
///
/// Rules are written as an exact branch name, a glob using `*` and `?`, or
/// `regexp(/pattern/flags)` where the only supported flag is `i`.
#[derive(Debug, Clone)]
pub enum BranchRule {
  Exact(String),
  Pattern { source: String, regex: Regex },
}

impl BranchRule {
  pub fn parse(rule: &str) -> Result<Self, Error> {
    let rule = rule.trim();
    if let Some(inner) = rule.strip_prefix(REGEXP_PREFIX).and_then(|rest| rest.strip_suffix(')')) {
      let regex = compile_regexp(rule, inner)?;
      return Ok(BranchRule::Pattern { source: rule.to_string(), regex });
    }
    if rule.contains(['*', '?']) {
      let regex = compile_glob(rule)?;
      return Ok(BranchRule::Pattern { source: rule.to_string(), regex });
    }
    Ok(BranchRule::Exact(rule.to_string()))
  }

  pub fn matches(&self, branch_name: &str) -> bool {
    match self {
      BranchRule::Exact(name) => name == branch_name,
      BranchRule::Pattern { regex, .. } => regex.is_match(branch_name),
    }
  }

  pub fn source(&self) -> &str {
    match self {
      BranchRule::Exact(name) => name,
      BranchRule::Pattern { source, .. } => source,
    }
  }
}

fn compile_regexp(rule: &str, inner: &str) -> Result<Regex, Error> {
  // `/pattern/flags`; a bare pattern without delimiters is accepted as is.
  let (pattern, flags) = match inner.strip_prefix('/').and_then(|rest| rest.rsplit_once('/')) {
    Some((pattern, flags)) => (pattern, flags),
    None => (inner, ""),
  };
  RegexBuilder::new(pattern)
    .case_insensitive(flags.contains('i'))
    .build()
    .map_err(|source| Error::InvalidBranchRule { rule: rule.to_string(), source })
}

fn compile_glob(rule: &str) -> Result<Regex, Error> {
  let mut pattern = String::from("^");
  for c in rule.chars() {
    match c {
      '*' => pattern.push_str(".*"),
      '?' => pattern.push('.'),
      _ => pattern.push_str(&regex::escape(&c.to_string())),
    }
  }
  pattern.push('$');
  Regex::new(&pattern).map_err(|source| Error::InvalidBranchRule { rule: rule.to_string(), source })
}

/// An ordered set of rules; an empty set matches every branch.
#[derive(Debug, Clone, Default, Deref, DerefMut)]
pub struct BranchRuleSet(Vec<BranchRule>);

impl BranchRuleSet {
  pub fn parse<S: AsRef<str>>(rules: &[S]) -> Result<Self, Error> {
    let parsed =
      rules.iter().map(|rule| rule.as_ref()).filter(|rule| !rule.trim().is_empty()).map(BranchRule::parse);
    Ok(BranchRuleSet(parsed.collect::<Result<Vec<_>, _>>()?))
  }

  pub fn matches_any(&self, branch_name: &str) -> bool {
    self.iter().any(|rule| rule.matches(branch_name))
  }

  /// True when the branch is selected by this set, treating an empty set as "all branches".
  pub fn selects(&self, branch_name: &str) -> bool {
    self.is_empty() || self.matches_any(branch_name)
  }

  pub fn display(&self) -> String {
    self.iter().map(BranchRule::source).collect::<Vec<_>>().join(", ")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exact_rule() {
    let rule = BranchRule::parse("main").unwrap();

    assert!(rule.matches("main"));
    assert!(!rule.matches("main2"));
    assert!(!rule.matches("origin/main"));
  }

  #[test]
  fn test_glob_rule() {
    let rule = BranchRule::parse("release/*").unwrap();

    assert!(rule.matches("release/1.0"));
    assert!(!rule.matches("main"));
    assert!(!rule.matches("pre-release/1.0"));
  }

  #[test]
  fn test_glob_escapes_regex_characters() {
    let rule = BranchRule::parse("v1.?").unwrap();

    assert!(rule.matches("v1.2"));
    assert!(!rule.matches("v122"));
  }

  #[test]
  fn test_regexp_rule_with_flags() {
    let rule = BranchRule::parse("regexp(/^hotfix-/i)").unwrap();

    assert!(rule.matches("HOTFIX-123"));
    assert!(rule.matches("hotfix-9"));
    assert!(!rule.matches("feature/hotfix-1"));
  }

  #[test]
  fn test_invalid_regexp_is_rejected() {
    let result = BranchRule::parse("regexp(/[unclosed/)");

    assert!(matches!(result, Err(Error::InvalidBranchRule { .. })));
  }

  #[test]
  fn test_empty_set_selects_everything() {
    let rules = BranchRuleSet::parse::<&str>(&[]).unwrap();

    assert!(rules.selects("anything"));
    assert!(!rules.matches_any("anything"));
  }

  #[test]
  fn test_blank_rules_are_ignored() {
    let rules = BranchRuleSet::parse(&["", "  ", "main"]).unwrap();

    assert_eq!(rules.len(), 1);
    assert_eq!(rules.display(), "main");
  }
}
