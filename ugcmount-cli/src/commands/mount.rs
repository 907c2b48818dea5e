//! `mount`: run one refresh over a sideload directory and list the live set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use ugcmount::config::UgcSettings;
use ugcmount::platform::local::LocalHost;
use ugcmount::platform::HostEnvironment;
use ugcmount::provider::SideloadProvider;
use ugcmount::registry::{RefreshOutcome, UgcRegistry};
use ugcmount::MountState;

use super::common::GlobalArgs;
use crate::error::CliError;

/// Snapshot of one live package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedPackage {
    pub name: String,
    pub id: String,
    pub state: MountState,
    pub archives: Vec<PathBuf>,
}

/// Mount everything below `dir` on a fresh local host.
///
/// Packages are listed by name and torn down again before returning.
pub fn mount_directory(
    environment: HostEnvironment,
    settings: UgcSettings,
    dir: &Path,
) -> Result<(RefreshOutcome, Vec<MountedPackage>), CliError> {
    if !dir.is_dir() {
        return Err(CliError::NotADirectory(dir.to_path_buf()));
    }

    debug!(dir = %dir.display(), editor = environment.is_editor, "Mounting sideload directory");
    let host = LocalHost::new(environment);
    let mut registry = UgcRegistry::new(host.services.clone(), settings)
        .with_provider(Arc::new(SideloadProvider::new(dir)));
    let outcome = registry.initialize_provider()?;

    let mut packages: Vec<MountedPackage> = registry
        .packages()
        .map(|package| MountedPackage {
            name: package.name().to_string(),
            id: package
                .id()
                .map_or_else(|| "sideloaded".to_string(), |id| id.to_string()),
            state: package.mount_state(),
            archives: package.mounted_archives().to_vec(),
        })
        .collect();
    packages.sort_by(|a, b| a.name.cmp(&b.name));

    let released = registry.unload_all();
    debug!(released, "Released test-mounted packages");
    registry.shutdown();
    Ok((outcome, packages))
}

pub fn run(globals: &GlobalArgs, dir: &Path) -> Result<(), CliError> {
    let (outcome, packages) = mount_directory(globals.environment()?, globals.settings()?, dir)?;

    let summary = match outcome {
        RefreshOutcome::Skipped(reason) => {
            println!("Refresh skipped: {}", reason);
            return Ok(());
        }
        RefreshOutcome::Completed(summary) => summary,
    };

    println!("Mounted {} package(s) from {}", summary.loaded, dir.display());
    for package in &packages {
        println!("{}", package.name);
        println!("  Id:       {}", package.id);
        println!("  State:    {:?}", package.state);
        for archive in &package.archives {
            println!("  Archive:  {}", archive.display());
        }
    }
    Ok(())
}
