//! Dispatcher behaviour across vendors: hints, fallthrough, damaged containers and hostile
//! input.

#[path = "../src/test/builders.rs"]
mod builders;

use std::fs;

use builders::{
    ahnlab_container, avast_container, bup_container, defender_entries, defender_resource,
    trendmicro_container, utf16z,
};
use dexray::{prelude::*, Result};
use tempfile::TempDir;

fn input(dir: &TempDir, hint: &str) -> Result<QuarantineInput> {
    let scratch = dir.path().join("scratch");
    fs::create_dir_all(&scratch)?;
    Ok(QuarantineInput::new(
        dir.path().join("sample.bin"),
        "d1ce",
        scratch,
        hint,
    ))
}

fn scratch_files(dir: &TempDir) -> Result<usize> {
    Ok(fs::read_dir(dir.path().join("scratch"))?.count())
}

fn containers() -> Vec<(Vendor, Vec<u8>)> {
    vec![
        (
            Vendor::AhnLab,
            ahnlab_container("C:\\a\\b.exe", "Trojan/Win32.X", b"MZ ahnlab"),
        ),
        (Vendor::AvastAvg, avast_container(b"MZ avast")),
        (
            Vendor::McAfeeBup,
            bup_container(
                "[Details]\nDetectionName=X\n[File_0]\nOriginalName=C:\\b.exe\n",
                &[b"MZ mcafee".as_slice()],
            ),
        ),
        (Vendor::Defender, defender_resource(b"MZ defender")),
        (
            Vendor::Defender,
            defender_entries("Virus:X", 0, &[("C:\\b.exe", "file", None)]),
        ),
        (
            Vendor::TrendMicro,
            trendmicro_container(&[(1, utf16z("C:\\b.exe"))], b"MZ trend"),
        ),
    ]
}

#[test]
fn test_unknown_input_falls_through() -> Result<()> {
    let dir = TempDir::new()?;
    let input = input(&dir, "")?;

    let extraction = Dispatcher::default().decode_data(&input, b"PK\x03\x04 not a quarantine file")?;
    assert!(extraction.is_empty());
    assert_eq!(extraction.vendor, None);
    assert!(extraction.diagnostics.is_empty());
    assert_eq!(scratch_files(&dir)?, 0);
    Ok(())
}

#[test]
fn test_wrong_hint_is_advisory() -> Result<()> {
    for (vendor, container) in containers() {
        for hint in ["defender", "quarantine/ahnlab", "quarantine/kaspersky", ""] {
            let dir = TempDir::new()?;
            let extraction = Dispatcher::default().decode_data(&input(&dir, hint)?, &container)?;
            assert_eq!(extraction.vendor, Some(vendor), "hint {hint:?}");
        }
    }
    Ok(())
}

#[test]
fn test_exhaustive_matches_hinted() -> Result<()> {
    for (_, container) in containers() {
        let hinted_dir = TempDir::new()?;
        let exhaustive_dir = TempDir::new()?;

        let hinted =
            Dispatcher::default().decode_data(&input(&hinted_dir, "trendmicro")?, &container)?;
        let exhaustive = Dispatcher::new(DecoderConfig::exhaustive())
            .decode_data(&input(&exhaustive_dir, "trendmicro")?, &container)?;

        assert_eq!(hinted.vendor, exhaustive.vendor);
        assert_eq!(hinted.metadata, exhaustive.metadata);
    }
    Ok(())
}

#[test]
fn test_malformed_after_magic_continues() -> Result<()> {
    let dir = TempDir::new()?;
    let mut container = ahnlab_container("C:\\a.exe", "X", b"MZ");
    container.truncate(0x40);

    let extraction = Dispatcher::default().decode_data(&input(&dir, "ahnlab")?, &container)?;
    assert!(extraction.is_empty());
    assert_eq!(extraction.diagnostics.len(), 1);
    assert_eq!(extraction.diagnostics[0].vendor, Vendor::AhnLab);
    assert!(extraction.diagnostics[0].reason.contains("truncated"));
    assert_eq!(scratch_files(&dir)?, 0);
    Ok(())
}

#[test]
fn test_idempotent_across_scratch_dirs() -> Result<()> {
    for (_, container) in containers() {
        let first_dir = TempDir::new()?;
        let second_dir = TempDir::new()?;

        let first = Dispatcher::default().decode_data(&input(&first_dir, "")?, &container)?;
        let second = Dispatcher::default().decode_data(&input(&second_dir, "")?, &container)?;

        assert_eq!(first.vendor, second.vendor);
        assert_eq!(first.metadata, second.metadata);
        assert_eq!(first.entries.len(), second.entries.len());
        for (a, b) in first.entries.iter().zip(&second.entries) {
            assert_eq!(a.display_name, b.display_name);
            assert_eq!(a.stored_path.file_name(), b.stored_path.file_name());
            assert_eq!(fs::read(&a.stored_path)?, fs::read(&b.stored_path)?);
        }
    }
    Ok(())
}

#[test]
fn test_decode_from_disk() -> Result<()> {
    let dir = TempDir::new()?;
    let input = input(&dir, "quarantine/avast")?;
    fs::write(&input.file_path, avast_container(b"MZ on disk"))?;

    let extraction = decode_quarantine(&input)?;
    assert_eq!(extraction.vendor, Some(Vendor::AvastAvg));
    assert_eq!(fs::read(&extraction.entries[0].stored_path)?, b"MZ on disk");
    Ok(())
}

#[test]
fn test_truncation_never_panics() -> Result<()> {
    for (_, container) in containers() {
        let dir = TempDir::new()?;
        let input = input(&dir, "")?;
        let step = (container.len() / 97).max(1);

        for len in (0..container.len()).step_by(step) {
            let extraction = Dispatcher::default().decode_data(&input, &container[..len])?;
            if extraction.vendor.is_none() {
                assert!(extraction.entries.is_empty());
            }
        }
    }
    Ok(())
}

#[test]
fn test_mutation_never_panics() -> Result<()> {
    // xorshift, fixed seed
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    for (_, container) in containers() {
        let dir = TempDir::new()?;
        let input = input(&dir, "")?;

        for _ in 0..64 {
            let mut mutated = container.clone();
            for _ in 0..4 {
                let at = (next() as usize) % mutated.len();
                mutated[at] = next() as u8;
            }
            Dispatcher::default().decode_data(&input, &mutated)?;
        }
    }
    Ok(())
}
