//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download videos from YouTube, Twitter/X, Instagram and Facebook links.
///
/// Each page URL is resolved to a direct media URL, then streamed to disk
/// with a progress bar. URLs may also be piped in on stdin, one per line.
#[derive(Parser, Debug)]
#[command(name = "fetchit")]
#[command(author, version, about)]
pub struct Args {
    /// Page URLs to download (reads stdin when omitted)
    pub urls: Vec<String>,

    /// Write the video to this file (single URL only)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Directory for generated file names (default: config `output_dir`, else current directory)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the resolved direct URL instead of downloading
    #[arg(long)]
    pub resolve_only: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["fetchit"]).unwrap();
        assert!(args.urls.is_empty());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.resolve_only);
        assert!(args.output.is_none());
        assert!(args.output_dir.is_none());
        assert!(args.config.is_none());
    }

    #[test]
    fn test_cli_positional_urls() {
        let args = Args::try_parse_from([
            "fetchit",
            "https://youtu.be/abc",
            "https://twitter.com/u/status/1",
        ])
        .unwrap();
        assert_eq!(
            args.urls,
            vec!["https://youtu.be/abc", "https://twitter.com/u/status/1"]
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["fetchit", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["fetchit", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["fetchit", "--verbose", "--verbose"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["fetchit", "-q"]).unwrap();
        assert!(args.quiet);

        let args = Args::try_parse_from(["fetchit", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_output_flags() {
        let args = Args::try_parse_from([
            "fetchit",
            "-o",
            "clip.mp4",
            "-d",
            "/tmp/videos",
            "--config",
            "/etc/fetchit.toml",
            "https://youtu.be/abc",
        ])
        .unwrap();
        assert_eq!(args.output, Some(PathBuf::from("clip.mp4")));
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/videos")));
        assert_eq!(args.config, Some(PathBuf::from("/etc/fetchit.toml")));
    }

    #[test]
    fn test_cli_resolve_only_flag() {
        let args = Args::try_parse_from(["fetchit", "--resolve-only", "https://youtu.be/a"]).unwrap();
        assert!(args.resolve_only);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["fetchit", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["fetchit", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["fetchit", "--invalid-flag"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
