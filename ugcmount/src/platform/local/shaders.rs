//! Shader library bookkeeping.

use std::collections::BTreeSet;

use parking_lot::Mutex;
use tracing::debug;

use crate::platform::{Plugin, ShaderLibrary};

/// Tracks which plugin shader libraries are open.
///
/// A plugin has a library when its content directory contains a
/// `ShaderArchive-*.ushaderbytecode` file.
#[derive(Debug, Default)]
pub struct LocalShaderLibrary {
    open: Mutex<BTreeSet<String>>,
}

impl LocalShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, name: &str) -> bool {
        self.open.lock().contains(name)
    }

    pub fn open_count(&self) -> usize {
        self.open.lock().len()
    }
}

fn has_shader_archive(plugin: &dyn Plugin) -> bool {
    let Ok(entries) = std::fs::read_dir(plugin.content_dir()) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let name = entry.file_name().to_string_lossy().into_owned();
        name.starts_with("ShaderArchive-") && name.ends_with(".ushaderbytecode")
    })
}

impl ShaderLibrary for LocalShaderLibrary {
    fn open_plugin_library(&self, plugin: &dyn Plugin) -> bool {
        if !plugin.can_contain_content() || !has_shader_archive(plugin) {
            return false;
        }
        debug!(plugin = plugin.name(), "Opened shader library");
        self.open.lock().insert(plugin.name().to_string());
        true
    }

    fn close_library(&self, name: &str) {
        if self.open.lock().remove(name) {
            debug!(plugin = name, "Closed shader library");
        }
    }
}
