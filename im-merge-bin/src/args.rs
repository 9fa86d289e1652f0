use std::path::PathBuf;

use clap::*;
use im_merge::{Job, Layout, Overflow};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Merge hex word programs into a flat instruction-memory image")]
pub struct Args {
    /// Primary program, loaded from address 0
    #[arg(long, default_value = "code.txt")]
    pub code: PathBuf,

    /// Handler program, loaded from the handler offset; skipped if missing
    #[arg(long, default_value = "code_handler.txt")]
    pub handler: PathBuf,

    /// Merged image, one unsigned decimal word per line
    #[arg(short, long, default_value = "im_data.txt")]
    pub output: PathBuf,

    /// What to do with words that don't fit in the image
    #[arg(long, value_enum, default_value_t = OverflowArg::Reject)]
    pub overflow: OverflowArg,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (-q warnings only, -qq errors only)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowArg {
    Reject,
    Truncate,
}

impl From<OverflowArg> for Overflow {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Reject => Self::Reject,
            OverflowArg::Truncate => Self::Truncate,
        }
    }
}

impl Args {
    pub fn job(&self) -> Job {
        Job {
            code: self.code.clone(),
            handler: self.handler.clone(),
            output: self.output.clone(),
            overflow: self.overflow.into(),
            layout: Layout::DEFAULT,
        }
    }

    /// Default log filter when `RUST_LOG` isn't set.
    pub fn level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "info",
            (1, _) => "debug",
            (_, 0) => "trace",
            (_, 1) => "warn",
            _ => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_fixed_file_names() {
        let args = Args::try_parse_from(["im-merge"]).unwrap();
        assert_eq!(args.job(), Job::default());
        assert_eq!(args.level(), "info");
    }

    #[test]
    fn paths_and_policy_can_be_overridden() {
        let args = Args::try_parse_from([
            "im-merge", "--code", "a.hex", "--handler", "b.hex", "-o", "out.txt", "--overflow", "truncate",
        ])
        .unwrap();
        let job = args.job();

        assert_eq!(job.code, PathBuf::from("a.hex"));
        assert_eq!(job.handler, PathBuf::from("b.hex"));
        assert_eq!(job.output, PathBuf::from("out.txt"));
        assert_eq!(job.overflow, Overflow::Truncate);
        assert_eq!(job.layout, Layout::DEFAULT);
    }

    #[test]
    fn every_flag_has_help() {
        let cmd = Args::command();
        for arg in cmd.get_arguments() {
            assert!(arg.get_help().is_some(), "`{}` has no help text", arg.get_id());
        }
    }

    #[test]
    fn verbosity_flags() {
        let level = |argv: &[&str]| Args::try_parse_from(argv).unwrap().level();
        assert_eq!(level(&["im-merge", "-v"]), "debug");
        assert_eq!(level(&["im-merge", "-vv"]), "trace");
        assert_eq!(level(&["im-merge", "-q"]), "warn");
        assert_eq!(level(&["im-merge", "-qqq"]), "error");
        assert!(Args::try_parse_from(["im-merge", "-v", "-q"]).is_err());
    }
}
