use std::io;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use slotjar_codec::CodecError;
use slotjar_harness::{samples, Harness, HarnessConfig, JsonRenderer, Renderer, TextRenderer};
use slotjar_store::{FsSlotStore, SlotName, SlotStore};

use crate::cli::*;
use crate::console::ConsoleRenderer;
use crate::hexdump::hex_dump;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(&config, cli.format),
        Command::Show(args) => cmd_show(&config, &args.slot, cli.format),
        Command::Dump(args) => cmd_dump(&config, &args.slot),
        Command::List => cmd_list(&config),
        Command::Pickle(args) => cmd_pickle(&args.file, cli.format),
    }
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if cli.create {
        config.create_data_dir = true;
    }
    if cli.no_verify {
        config.verify = false;
    }
    Ok(config)
}

/// Text output is labelled with the slot name when `labelled` is set.
fn renderer(format: OutputFormat, labelled: bool) -> Box<dyn Renderer> {
    let stdout = io::stdout().lock();
    match format {
        OutputFormat::Text if labelled => Box::new(ConsoleRenderer::new(stdout)),
        OutputFormat::Text => Box::new(TextRenderer::new(stdout)),
        OutputFormat::Json => Box::new(JsonRenderer::new(stdout)),
    }
}

fn cmd_run(config: &HarnessConfig, format: OutputFormat) -> anyhow::Result<()> {
    let store = config.open_store().context("cannot open data directory")?;
    let samples = samples()?;
    let mut harness = Harness::new(store, renderer(format, true)).with_verify(config.verify);
    let report = harness.run(&samples).context("round-trip run failed")?;

    if format == OutputFormat::Text {
        eprintln!(
            "{} {} slots round-tripped ({} bytes)",
            "✓".green().bold(),
            report.len(),
            report.total_bytes()
        );
        if report.mismatches() > 0 {
            eprintln!(
                "{} {} slots read back different from what was written",
                "!".yellow().bold(),
                report.mismatches()
            );
        }
    }
    Ok(())
}

fn cmd_show(config: &HarnessConfig, slot: &SlotName, format: OutputFormat) -> anyhow::Result<()> {
    let store = config.open_store().context("cannot open data directory")?;
    let mut harness = Harness::new(store, renderer(format, false));
    harness
        .read(slot)
        .with_context(|| format!("cannot read slot {slot}"))?;
    Ok(())
}

fn cmd_dump(config: &HarnessConfig, slot: &SlotName) -> anyhow::Result<()> {
    let store = config.open_store().context("cannot open data directory")?;
    let blob = store
        .get_raw(slot)
        .with_context(|| format!("cannot read slot {slot}"))?;

    println!("{} {} ({} bytes)", "slot".bold(), slot.as_str().yellow(), blob.len());
    match slotjar_codec::inspect(&blob) {
        Ok(header) => {
            let kind = slotjar_codec::peek_kind(&blob[slotjar_codec::HEADER_LEN..])
                .map_or_else(|| "?".to_string(), |k| k.to_string());
            println!(
                "  format v{}, payload {} bytes, crc32 {:08x}, outer kind {}",
                header.version,
                header.payload_len,
                header.crc32,
                kind.cyan()
            );
        }
        Err(e) => println!("  {} {e}", "invalid header:".red()),
    }
    match blob_status(&blob) {
        Ok(()) => println!("  {}", "checksum and payload ok".green()),
        Err(CodecError::ChecksumMismatch { expected, computed }) => println!(
            "  {} stored {expected:08x}, computed {computed:08x}",
            "checksum mismatch:".red()
        ),
        Err(e) => println!("  {} {e}", "unreadable:".red()),
    }
    for line in hex_dump(&blob) {
        println!("{line}");
    }
    Ok(())
}

/// Full integrity check of a stored blob: frame, checksum and payload.
fn blob_status(blob: &[u8]) -> Result<(), CodecError> {
    slotjar_codec::open(blob).map(|_| ())
}

struct SlotSummary {
    slot: SlotName,
    bytes: usize,
    intact: bool,
}

fn summarize(store: &FsSlotStore) -> anyhow::Result<Vec<SlotSummary>> {
    store
        .list()?
        .into_iter()
        .map(|slot| {
            let blob = store
                .get_raw(&slot)
                .with_context(|| format!("cannot read slot {slot}"))?;
            Ok(SlotSummary {
                bytes: blob.len(),
                intact: blob_status(&blob).is_ok(),
                slot,
            })
        })
        .collect()
}

fn cmd_list(config: &HarnessConfig) -> anyhow::Result<()> {
    let store = config.open_store().context("cannot open data directory")?;
    let summaries = summarize(&store)?;
    if summaries.is_empty() {
        println!("No slots in {}.", store.dir().display());
        return Ok(());
    }
    for s in &summaries {
        let status = if s.intact { "ok".green() } else { "corrupt".red() };
        println!("{:<16} {:>8} bytes  {}", s.slot.as_str().yellow(), s.bytes, status);
    }
    Ok(())
}

fn cmd_pickle(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let data = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let values = slotjar_codec::pickle::load_all(&data)
        .with_context(|| format!("cannot decode pickle stream {}", path.display()))?;
    for (index, value) in values.iter().enumerate() {
        match format {
            OutputFormat::Text => println!("{value}"),
            OutputFormat::Json => {
                let line = serde_json::json!({ "index": index, "value": value });
                println!("{line}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use slotjar_store::StoreError;
    use slotjar_value::Value;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("slotjar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let config = load_config(&cli(&["--data-dir", "/tmp/x", "--create", "--no-verify"])).unwrap();
        assert_eq!(config.data_dir, Some("/tmp/x".into()));
        assert!(config.create_data_dir);
        assert!(!config.verify);
    }

    #[test]
    fn flags_override_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("slotjar.toml");
        std::fs::write(&path, "data_dir = \"from-file\"\n").unwrap();
        let path_arg = path.to_str().unwrap();

        let config = load_config(&cli(&["--config", path_arg])).unwrap();
        assert_eq!(config.data_dir, Some(tmp.path().join("from-file")));

        let config = load_config(&cli(&["--config", path_arg, "--data-dir", "/elsewhere"])).unwrap();
        assert_eq!(config.data_dir, Some("/elsewhere".into()));
    }

    #[test]
    fn run_writes_every_sample_slot() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        let data_arg = data.to_str().unwrap();

        run_command(cli(&["--data-dir", data_arg, "--create", "--format", "json"])).unwrap();

        let store = FsSlotStore::open(&data).unwrap();
        let names: Vec<String> = store.list().unwrap().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["test1", "test2", "test3", "test4", "test5"]);
    }

    #[test]
    fn run_without_data_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("missing");
        let err = run_command(cli(&["--data-dir", data.to_str().unwrap()])).unwrap_err();
        assert!(err.downcast_ref::<slotjar_harness::HarnessError>().is_some());
        assert!(!data.exists());
    }

    #[test]
    fn show_missing_slot_names_it() {
        let tmp = tempfile::tempdir().unwrap();
        let data_arg = tmp.path().to_str().unwrap();
        let err = run_command(cli(&["--data-dir", data_arg, "show", "absent"])).unwrap_err();
        assert!(format!("{err:#}").contains("absent"));
    }

    #[test]
    fn dump_and_list_existing_slot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsSlotStore::open(tmp.path()).unwrap();
        store
            .put(&SlotName::new("t1").unwrap(), &Value::tuple([1, 2]))
            .unwrap();
        let data_arg = tmp.path().to_str().unwrap();

        run_command(cli(&["--data-dir", data_arg, "dump", "t1"])).unwrap();
        run_command(cli(&["--data-dir", data_arg, "list"])).unwrap();
    }

    fn damage_last_byte(path: &std::path::Path) {
        let mut raw = std::fs::read(path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        std::fs::write(path, raw).unwrap();
    }

    #[test]
    fn list_flags_checksum_damage() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsSlotStore::open(tmp.path()).unwrap();
        for name in ["good", "bad"] {
            store
                .put(&SlotName::new(name).unwrap(), &Value::tuple([1, 2]))
                .unwrap();
        }
        damage_last_byte(&tmp.path().join("bad"));

        let blob = store.get_raw(&SlotName::new("bad").unwrap()).unwrap();
        assert!(slotjar_codec::inspect(&blob).is_ok());
        assert!(matches!(
            blob_status(&blob),
            Err(CodecError::ChecksumMismatch { .. })
        ));

        let summaries = summarize(&store).unwrap();
        let status: Vec<(&str, bool)> = summaries
            .iter()
            .map(|s| (s.slot.as_str(), s.intact))
            .collect();
        assert_eq!(status, [("bad", false), ("good", true)]);

        let data_arg = tmp.path().to_str().unwrap();
        run_command(cli(&["--data-dir", data_arg, "list"])).unwrap();
        run_command(cli(&["--data-dir", data_arg, "dump", "bad"])).unwrap();
        let err = run_command(cli(&["--data-dir", data_arg, "show", "bad"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<slotjar_harness::HarnessError>(),
            Some(slotjar_harness::HarnessError::Store(StoreError::Corrupt { .. }))
        ));
    }

    /// `pickle.dumps(test1, protocol=4)` followed by the same for `test2`.
    const PICKLED_SAMPLES: &str = "\
        8004955400000000000000284b014b024b034b044b054b064b0787948c0454657374948c14\
        54686973206973206a757374206120746573742e945d94284b024b044b064b086586948c03\
        4f6e65948c0354776f948c0554687265659474942e\
        8004956200000000000000284b014740000000000000004b034740100000000000004b054b06\
        4b0787948c0454657374948c1454686973206973206a757374206120746573742e945d9428\
        4b024b044b064b086586948c034f6e65948c0354776f948c0554687265659474942e";

    fn unhex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn python_pickles_match_samples() {
        let values = slotjar_codec::pickle::load_all(&unhex(PICKLED_SAMPLES)).unwrap();
        let all = samples().unwrap();
        assert_eq!(values.len(), 2);
        assert!(values[0].same_as(&all[0].value));
        assert!(values[1].same_as(&all[1].value));
    }

    #[test]
    fn pickle_command_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("samples.pkl");
        std::fs::write(&path, unhex(PICKLED_SAMPLES)).unwrap();
        let path_arg = path.to_str().unwrap();

        run_command(cli(&["pickle", path_arg])).unwrap();
        run_command(cli(&["--format", "json", "pickle", path_arg])).unwrap();

        std::fs::write(&path, [0x80, 0x04, b'c']).unwrap();
        let err = run_command(cli(&["pickle", path_arg])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::Corrupt { offset: 2, .. })
        ));
    }

    #[test]
    fn dump_missing_slot_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let data_arg = tmp.path().to_str().unwrap();
        let err = run_command(cli(&["--data-dir", data_arg, "dump", "nope"])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { .. })
        ));
    }
}
