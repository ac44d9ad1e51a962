use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, disable_version_flag = true)]
pub struct Args {
    /// audio file to loop (mp3 or wav), defaults to the built in tone
    #[arg(short, long, value_name = "PATH")]
    pub ringtone: Option<PathBuf>,
    /// image or video to show behind the clock
    #[arg(short, long, value_name = "PATH")]
    pub background: Option<PathBuf>,
    /// initial snooze duration (default 5m)
    #[arg(short, long, value_name = "DURATION", value_parser = crate::duration::parse)]
    pub snooze: Option<Duration>,
    /// exit with status 2 after this long without interaction, 0 disables (default 1m)
    #[arg(short, long, value_name = "DURATION", value_parser = crate::duration::parse)]
    pub timeout: Option<Duration>,
    /// use this config file instead of the default one
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[allow(dead_code)]
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// write a default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn short_and_long_flags() {
        let args = Args::try_parse_from([
            "roosty_alarm",
            "-r",
            "ring.mp3",
            "--background",
            "bg.mp4",
            "-s",
            "10m",
            "--timeout",
            "0",
        ])
        .unwrap();
        assert_eq!(args.ringtone, Some(PathBuf::from("ring.mp3")));
        assert_eq!(args.background, Some(PathBuf::from("bg.mp4")));
        assert_eq!(args.snooze, Some(Duration::from_secs(600)));
        assert_eq!(args.timeout, Some(Duration::ZERO));
        assert!(args.command.is_none());
    }

    #[test]
    fn flags_are_optional() {
        let args = Args::try_parse_from(["roosty_alarm"]).unwrap();
        assert!(args.ringtone.is_none());
        assert!(args.snooze.is_none());
        assert!(args.timeout.is_none());
    }

    #[test]
    fn bad_duration_is_rejected() {
        let err = Args::try_parse_from(["roosty_alarm", "-t", "soon"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn lowercase_v_prints_version() {
        let err = Args::try_parse_from(["roosty_alarm", "-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn init_subcommand() {
        let args = Args::try_parse_from(["roosty_alarm", "init", "--force"]).unwrap();
        assert_eq!(args.command, Some(Command::Init { force: true }));
    }
}
