//! `scan`: list descriptors below a directory.

use std::path::{Path, PathBuf};

use ugcmount::compat::{CompatError, CompatibilityChecker};
use ugcmount::package::discovery::find_descriptors;

use super::common::GlobalArgs;
use crate::error::CliError;

/// One descriptor and its verdict.
#[derive(Debug)]
pub struct ScanEntry {
    pub descriptor: PathBuf,
    pub verdict: Result<(), CompatError>,
}

/// Check every descriptor beneath `dir`, in path order.
pub fn scan(checker: &CompatibilityChecker, dir: &Path) -> Result<Vec<ScanEntry>, CliError> {
    if !dir.is_dir() {
        return Err(CliError::NotADirectory(dir.to_path_buf()));
    }
    Ok(find_descriptors(dir)
        .into_iter()
        .map(|descriptor| {
            let verdict = checker.check_descriptor_file(&descriptor);
            ScanEntry { descriptor, verdict }
        })
        .collect())
}

pub fn run(globals: &GlobalArgs, dir: &Path) -> Result<(), CliError> {
    let checker = globals.checker()?;
    let entries = scan(&checker, dir)?;

    println!(
        "Scanning {} against engine {}",
        dir.display(),
        checker.current_version()
    );
    if entries.is_empty() {
        println!("  No descriptors found");
        return Ok(());
    }

    let compatible = entries.iter().filter(|e| e.verdict.is_ok()).count();
    for entry in &entries {
        match &entry.verdict {
            Ok(()) => println!("  [ok]      {}", entry.descriptor.display()),
            Err(e) => println!("  [skipped] {} ({})", entry.descriptor.display(), e),
        }
    }
    println!("{} of {} compatible", compatible, entries.len());
    Ok(())
}
