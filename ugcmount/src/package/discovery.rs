//! File discovery inside package directories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::naming::{ARCHIVE_EXTENSION, DESCRIPTOR_EXTENSION};

/// Find every mountable archive beneath `dir`, recursively.
///
/// The result is sorted and free of duplicates. A missing or unreadable
/// directory yields an empty list.
pub fn find_archives(dir: &Path) -> Vec<PathBuf> {
    find_files_with_extension(dir, ARCHIVE_EXTENSION)
}

/// Find every plugin descriptor beneath `dir`, recursively.
pub fn find_descriptors(dir: &Path) -> Vec<PathBuf> {
    find_files_with_extension(dir, DESCRIPTOR_EXTENSION)
}

/// Find files with the given extension (case-insensitive) beneath `dir`.
pub fn find_files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    collect_files_recursive(dir, extension, &mut found);
    found.into_iter().collect()
}

fn collect_files_recursive(dir: &Path, extension: &str, found: &mut BTreeSet<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, extension, found);
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            found.insert(path);
        }
    }
}
