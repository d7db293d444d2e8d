use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use clap::Parser;

use crate::checkpoint::{Calibration, DEFAULT_CYCLES_PER_SECOND};

/// Suffix appended to the log path to find its format registry by default.
pub const DEFAULT_FORMATS_SUFFIX: &str = ".formats.json";

/// Command line of the `decoder` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "decoder",
    version,
    about = "Decompresses binary log files into a human readable format."
)]
pub struct Cli {
    /// Compressed log file to decode
    #[arg(value_name = "logFile")]
    pub log_file: PathBuf,

    /// Stop after this many messages; 0 or omitted prints everything
    #[arg(
        value_name = "maxMessagesToPrint",
        allow_negative_numbers = true,
        value_parser = parse_message_count
    )]
    pub max_messages: Option<u64>,

    /// JSON format registry [default: <logFile>.formats.json]
    #[arg(long, env = "DECODER_FORMATS", value_name = "PATH")]
    pub formats: Option<PathBuf>,

    /// Cycle rate assumed until the log supplies a checkpoint
    #[arg(long, value_name = "HZ", default_value_t = DEFAULT_CYCLES_PER_SECOND, value_parser = parse_cycle_rate)]
    pub cycles_per_second: f64,
}

/// Resolved settings for one decode run.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    pub log_file: PathBuf,
    pub formats: PathBuf,
    /// `None` means no limit.
    pub max_messages: Option<u64>,
    pub calibration: Calibration,
}

impl DecoderConfig {
    /// Parses a full argument list, program name first.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Self::from)
    }
}

impl From<Cli> for DecoderConfig {
    fn from(cli: Cli) -> Self {
        let formats = cli
            .formats
            .unwrap_or_else(|| default_formats_path(cli.log_file.as_os_str()));
        // parse_cycle_rate already rejected unusable rates.
        let calibration = Calibration::new(cli.cycles_per_second).unwrap_or_default();

        Self {
            log_file: cli.log_file,
            formats,
            max_messages: cli.max_messages.filter(|&n| n > 0),
            calibration,
        }
    }
}

fn default_formats_path(log_file: &OsStr) -> PathBuf {
    let mut path = log_file.to_os_string();
    path.push(DEFAULT_FORMATS_SUFFIX);
    PathBuf::from(path)
}

fn parse_message_count(s: &str) -> Result<u64, String> {
    let count: i128 = s
        .parse()
        .map_err(|_| format!("Invalid # of messages to print, please enter a number: {}", s))?;
    if count < 0 {
        return Err(format!("# of messages to print must be positive: {}", s));
    }
    u64::try_from(count).map_err(|_| {
        format!(
            "# of messages to print is too large: {}. \
             If you intend to print all messages, omit it.",
            s
        )
    })
}

fn parse_cycle_rate(s: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .ok()
        .and_then(Calibration::new)
        .map(|c| c.cycles_per_second())
        .ok_or_else(|| format!("cycle rate must be a positive number: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let config = DecoderConfig::try_parse_from(["decoder", "run.bin", "25"]).unwrap();
        assert_eq!(config.log_file, PathBuf::from("run.bin"));
        assert_eq!(config.max_messages, Some(25));
        assert_eq!(config.formats, PathBuf::from("run.bin.formats.json"));
        assert_eq!(config.calibration, Calibration::default());
    }

    #[test]
    fn test_zero_means_no_limit() {
        let config = DecoderConfig::try_parse_from(["decoder", "run.bin", "0"]).unwrap();
        assert_eq!(config.max_messages, None);
        let config = DecoderConfig::try_parse_from(["decoder", "run.bin"]).unwrap();
        assert_eq!(config.max_messages, None);
    }

    #[test]
    fn test_options() {
        let config = DecoderConfig::try_parse_from([
            "decoder",
            "run.bin",
            "--formats",
            "schema.json",
            "--cycles-per-second",
            "2.4e9",
        ])
        .unwrap();
        assert_eq!(config.formats, PathBuf::from("schema.json"));
        assert_eq!(config.calibration.cycles_per_second(), 2.4e9);
    }

    #[test]
    fn test_usage_errors() {
        assert!(DecoderConfig::try_parse_from(["decoder"]).is_err());

        let negative = DecoderConfig::try_parse_from(["decoder", "run.bin", "-3"]).unwrap_err();
        assert!(negative.to_string().contains("must be positive"));

        let garbage = DecoderConfig::try_parse_from(["decoder", "run.bin", "ten"]).unwrap_err();
        assert!(garbage.to_string().contains("please enter a number"));

        assert!(DecoderConfig::try_parse_from(["decoder", "run.bin", "--cycles-per-second", "0"]).is_err());
    }
}
