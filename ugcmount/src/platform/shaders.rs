//! Shared shader code libraries.

use super::plugin::Plugin;

pub trait ShaderLibrary: Send + Sync {
    /// Open the shader library shipped with `plugin`. Returns `false` if it
    /// has none or it failed to open.
    fn open_plugin_library(&self, plugin: &dyn Plugin) -> bool;

    fn close_library(&self, name: &str);
}
