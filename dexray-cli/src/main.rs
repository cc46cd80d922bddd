mod app;
mod output;

use std::{fs, path::Path};

use anyhow::Context;
use clap::Parser;
use dexray::{
    report::{safe_name, Report},
    DecoderConfig, Dispatcher, Error, Extraction, QuarantineInput,
};
use sha2::{Digest, Sha256};

use crate::{
    app::Cli,
    output::{print_output, Align, TabWriter},
};

fn main() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .context("failed to set Ctrl+C handler")?;

    let cli = Cli::parse();

    // dexray info+ on stderr unless --json; --verbose enables debug; RUST_LOG overrides
    if !cli.global.json {
        let level = if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        env_logger::Builder::new()
            .filter_module("dexray", level)
            .parse_default_env()
            .target(env_logger::Target::Stderr)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .init();
    }

    run(&cli)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let hash = content_hash(&cli.path)?;
    let output_dir = match &cli.output_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;

    let config = if cli.no_hint {
        DecoderConfig::exhaustive()
    } else {
        DecoderConfig::default()
    };
    let hint = cli.hint.as_deref().unwrap_or_default();
    let input = QuarantineInput::new(&cli.path, &hash, &output_dir, hint);

    let extraction = Dispatcher::new(config)
        .decode(&input)
        .with_context(|| format!("failed to decode {}", cli.path.display()))?;

    if let Err(error @ Error::LimitExceeded { .. }) = extraction.check_limit(cli.max_extracted) {
        discard(&extraction);
        return Err(error.into());
    }

    let report = Report::from_extraction(&extraction);
    print_output(&report, &cli.global, |_| print_extraction(&extraction))
}

/// Hex SHA-256 of the file at `path`, used to name recovered files.
fn content_hash(path: &Path) -> anyhow::Result<String> {
    let data = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}

fn discard(extraction: &Extraction) {
    for entry in &extraction.entries {
        if let Err(error) = fs::remove_file(&entry.stored_path) {
            log::warn!("cannot remove {}: {error}", entry.stored_path.display());
        }
    }
}

fn print_extraction(extraction: &Extraction) {
    let Some(vendor) = extraction.vendor else {
        println!("No known quarantine format recognised.");
        for diagnostic in &extraction.diagnostics {
            println!("  {}: {}", diagnostic.vendor, diagnostic.reason);
        }
        return;
    };

    println!("{vendor} quarantine");

    if !extraction.entries.is_empty() {
        println!();
        let mut table = TabWriter::new(&[
            ("#", Align::Right),
            ("Name", Align::Left),
            ("Stored As", Align::Left),
        ])
        .indent("  ");
        for (index, entry) in extraction.entries.iter().enumerate() {
            table.row(vec![
                index.to_string(),
                safe_name(&entry.display_name, &entry.stored_path),
                entry.stored_path.display().to_string(),
            ]);
        }
        table.print();
    }

    if !extraction.metadata.is_empty() {
        println!();
        let mut table =
            TabWriter::new(&[("Field", Align::Left), ("Value", Align::Left)]).indent("  ");
        for (key, value) in extraction.metadata.iter() {
            table.row(vec![key.to_string(), value.to_string()]);
        }
        table.print();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            content_hash(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
