use std::path::PathBuf;

use clap::Parser;

use crate::utils::version;

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
  #[arg(short, long, value_name = "FLOAT", help = "Tick rate, i.e. number of ticks per second", default_value_t = 4.0)]
  pub tick_rate: f64,

  #[arg(
    short,
    long,
    value_name = "FLOAT",
    help = "Frame rate, i.e. number of frames per second",
    default_value_t = 30.0
  )]
  pub frame_rate: f64,

  #[arg(short, long, value_name = "FILE", help = "Extra configuration file layered over the defaults")]
  pub config: Option<PathBuf>,

  #[arg(short, long, value_name = "FILE", help = "Trigger rules file to edit")]
  pub rules: Option<PathBuf>,

  #[arg(short, long, value_name = "ROWS", help = "Branches shown per page")]
  pub page_size: Option<usize>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let cli = Cli::parse_from(["branch-rules"]);

    assert_eq!(cli.tick_rate, 4.0);
    assert_eq!(cli.frame_rate, 30.0);
    assert!(cli.rules.is_none());
  }

  #[test]
  fn test_overrides() {
    let cli = Cli::parse_from(["branch-rules", "--rules", "rules.json5", "--page-size", "10", "-c", "extra.toml"]);

    assert_eq!(cli.rules, Some(PathBuf::from("rules.json5")));
    assert_eq!(cli.page_size, Some(10));
    assert_eq!(cli.config, Some(PathBuf::from("extra.toml")));
  }
}
