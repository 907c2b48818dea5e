//! `check`: verdict for a single descriptor.

use std::path::Path;

use ugcmount::platform::PluginDescriptor;

use super::common::GlobalArgs;
use crate::error::CliError;

pub fn run(globals: &GlobalArgs, descriptor: &Path) -> Result<(), CliError> {
    if !descriptor.is_file() {
        return Err(CliError::DescriptorNotFound(descriptor.to_path_buf()));
    }
    let checker = globals.checker()?;

    if let Ok(parsed) = PluginDescriptor::load(descriptor) {
        println!("Descriptor:     {}", descriptor.display());
        println!("  Name:         {}", parsed.friendly_name);
        println!("  Category:     {}", parsed.category);
        println!("  Built for:    {}", parsed.engine_version);
        println!("  UGC:          {}", if parsed.is_ugc() { "yes" } else { "no" });
    }
    println!("  Running:      {}", checker.current_version());

    checker
        .check_descriptor_file(descriptor)
        .map_err(|source| CliError::Incompatible {
            path: descriptor.to_path_buf(),
            source,
        })?;
    println!("Compatible");
    Ok(())
}
