use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use slotjar_store::SlotName;

#[derive(Parser)]
#[command(
    name = "slotjar",
    about = "Round-trip sample values through named slot files and print them back",
    version
)]
pub struct Cli {
    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Data directory (default: `data/` next to the executable).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Create the data directory if it does not exist.
    #[arg(long, global = true)]
    pub create: bool,

    /// Skip comparing reloaded values with the written ones.
    #[arg(long, global = true)]
    pub no_verify: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write every sample, then read and print each one back
    Run,
    /// Read and print a single slot
    Show(ShowArgs),
    /// Hex dump the raw blob stored in a slot
    Dump(DumpArgs),
    /// List occupied slots
    List,
    /// Decode a Python pickle file (plain data only) and print its values
    Pickle(PickleArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    pub slot: SlotName,
}

#[derive(Args)]
pub struct DumpArgs {
    pub slot: SlotName,
}

#[derive(Args)]
pub struct PickleArgs {
    /// File holding one or more pickles back to back.
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_no_args_defaults() {
        let cli = Cli::try_parse_from(["slotjar"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.create);
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(cli.data_dir.is_none());
    }

    #[test]
    fn parse_run() {
        let cli = Cli::try_parse_from(["slotjar", "run"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Run)));
    }

    #[test]
    fn parse_show() {
        let cli = Cli::try_parse_from(["slotjar", "show", "test1"]).unwrap();
        if let Some(Command::Show(args)) = cli.command {
            assert_eq!(args.slot.as_str(), "test1");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_show_rejects_unsafe_slot() {
        assert!(Cli::try_parse_from(["slotjar", "show", "../etc/passwd"]).is_err());
        assert!(Cli::try_parse_from(["slotjar", "dump", ""]).is_err());
    }

    #[test]
    fn parse_dump() {
        let cli = Cli::try_parse_from(["slotjar", "dump", "test2"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Dump(_))));
    }

    #[test]
    fn parse_pickle() {
        let cli = Cli::try_parse_from(["slotjar", "pickle", "out/test1.pkl"]).unwrap();
        if let Some(Command::Pickle(args)) = cli.command {
            assert_eq!(args.file, PathBuf::from("out/test1.pkl"));
        } else { panic!("wrong command"); }
        assert!(Cli::try_parse_from(["slotjar", "pickle"]).is_err());
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "slotjar", "list", "--data-dir", "/tmp/data", "--create", "-v",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::List)));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/data")));
        assert!(cli.create);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["slotjar", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn parse_config_and_no_verify() {
        let cli = Cli::try_parse_from(["slotjar", "--config", "slotjar.toml", "--no-verify"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("slotjar.toml")));
        assert!(cli.no_verify);
    }
}
