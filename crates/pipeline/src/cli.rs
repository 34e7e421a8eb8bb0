//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

use crate::{ConfigurationError, DEFAULT_MANEUVER, REQUIRED_PATHS};

/// Build labeled maneuver trajectory datasets from four camera angles
#[derive(Parser, Debug)]
#[command(name = "maneuver-pipeline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store the generated time series for training (requires --maneuver)
    #[arg(long)]
    pub parse: bool,

    /// Maneuver name used as label and file prefix
    #[arg(long)]
    pub maneuver: Option<String>,

    /// Interactively print vehicle trajectories after the run
    #[arg(long)]
    pub plot: bool,

    /// Four directories of extracted image frames (not video files), one per
    /// camera, e.g. "a/0;a/90;a/180;a/270"
    #[arg(long = "video-path-list", value_name = "FRAME_DIRS")]
    pub video_path_list: String,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// A validated command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Export records after the run
    pub parse: bool,
    /// Upper-cased maneuver label
    pub maneuver: String,
    /// Run the trajectory prompt after the run
    pub plot: bool,
    /// A maneuver was given without --parse, so it only labels the run
    pub maneuver_unused: bool,
    /// One path per camera, in angle order
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Check flag combinations and split the path list
    pub fn validate(&self) -> Result<Invocation, ConfigurationError> {
        let maneuver = match (&self.maneuver, self.parse) {
            (Some(m), _) if !m.trim().is_empty() => m.trim().to_uppercase(),
            (_, true) => return Err(ConfigurationError::MissingManeuver),
            (_, false) => DEFAULT_MANEUVER.to_string(),
        };

        let paths = split_path_list(&self.video_path_list);
        if paths.len() != REQUIRED_PATHS {
            return Err(ConfigurationError::PathCount {
                expected: REQUIRED_PATHS,
                got: paths.len(),
            });
        }

        Ok(Invocation {
            parse: self.parse,
            maneuver,
            plot: self.plot,
            maneuver_unused: self.maneuver.is_some() && !self.parse,
            paths,
        })
    }
}

/// Split a `;`-separated path list, trimming whitespace around each entry
pub fn split_path_list(list: &str) -> Vec<PathBuf> {
    list.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("maneuver-pipeline").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_valid_invocation() {
        let cli = parse(&[
            "--parse",
            "--maneuver",
            "overtake",
            "--video-path-list",
            "v/0; v/90 ;v/180;v/270",
        ]);
        let inv = cli.validate().unwrap();
        assert!(inv.parse);
        assert!(!inv.plot);
        assert_eq!(inv.maneuver, "OVERTAKE");
        assert_eq!(inv.paths[1], PathBuf::from("v/90"));
        assert_eq!(inv.paths.len(), 4);
    }

    #[test]
    fn test_parse_requires_maneuver() {
        let cli = parse(&["--parse", "--video-path-list", "a;b;c;d"]);
        assert!(matches!(cli.validate(), Err(ConfigurationError::MissingManeuver)));
    }

    #[test]
    fn test_wrong_path_count() {
        let cli = parse(&["--plot", "--video-path-list", "a;b;c"]);
        assert!(matches!(
            cli.validate(),
            Err(ConfigurationError::PathCount { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn test_default_maneuver_without_parse() {
        let cli = parse(&["--plot", "--video-path-list", "a;b;c;d"]);
        let inv = cli.validate().unwrap();
        assert_eq!(inv.maneuver, DEFAULT_MANEUVER);
        assert!(inv.plot);
    }

    #[test]
    fn test_maneuver_without_parse_flagged() {
        let cli = parse(&["--maneuver", "overtake", "--video-path-list", "a;b;c;d"]);
        let inv = cli.validate().unwrap();
        assert!(inv.maneuver_unused);
        assert!(!inv.parse);

        let cli = parse(&["--parse", "--maneuver", "overtake", "--video-path-list", "a;b;c;d"]);
        assert!(!cli.validate().unwrap().maneuver_unused);
    }

    #[test]
    fn test_help_names_frame_directories() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("extracted image frames (not video files)"));
        assert!(help.contains("FRAME_DIRS"));
    }

    #[test]
    fn test_path_list_required() {
        assert!(Cli::try_parse_from(["maneuver-pipeline", "--parse"]).is_err());
    }
}
