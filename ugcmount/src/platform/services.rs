//! Host services bundle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{
    AssetRegistry, MountPointTable, PlatformFileManager, PluginManager, PrimaryAssetDirectory,
    ShaderLibrary, StreamableLoader,
};
use crate::compat::EngineVersion;

/// Facts about the running host that are not user configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub is_editor: bool,
    pub is_cooking: bool,
    pub is_commandlet: bool,
    pub can_render: bool,
    pub is_server_only: bool,
    pub engine_version: EngineVersion,
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::runtime(EngineVersion::new(5, 3, 0))
    }
}

impl HostEnvironment {
    /// A rendering game build.
    pub fn runtime(engine_version: EngineVersion) -> Self {
        Self {
            is_editor: false,
            is_cooking: false,
            is_commandlet: false,
            can_render: true,
            is_server_only: false,
            engine_version,
        }
    }

    /// An editor session.
    pub fn editor(engine_version: EngineVersion) -> Self {
        Self {
            is_editor: true,
            ..Self::runtime(engine_version)
        }
    }

    pub fn with_cooking(mut self, cooking: bool) -> Self {
        self.is_cooking = cooking;
        self
    }

    pub fn with_commandlet(mut self, commandlet: bool) -> Self {
        self.is_commandlet = commandlet;
        self
    }

    pub fn with_rendering(mut self, can_render: bool) -> Self {
        self.can_render = can_render;
        self
    }

    pub fn with_server_only(mut self, server_only: bool) -> Self {
        self.is_server_only = server_only;
        self
    }

    /// UGC is never loaded while cooking or running a commandlet.
    pub fn skips_ugc(&self) -> bool {
        self.is_cooking || self.is_commandlet
    }

    /// Whether shader libraries can be used at all.
    pub fn uses_shaders(&self) -> bool {
        self.can_render && !self.is_server_only
    }
}

/// Every host facility the registry and packages use.
#[derive(Clone)]
pub struct HostServices {
    pub files: Arc<PlatformFileManager>,
    pub plugins: Arc<dyn PluginManager>,
    pub mount_points: Arc<MountPointTable>,
    pub asset_registry: Arc<dyn AssetRegistry>,
    pub primary_assets: Arc<dyn PrimaryAssetDirectory>,
    pub loader: Arc<dyn StreamableLoader>,
    pub shaders: Arc<dyn ShaderLibrary>,
    pub environment: HostEnvironment,
    exit_requested: Arc<AtomicBool>,
}

impl HostServices {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        files: Arc<PlatformFileManager>,
        plugins: Arc<dyn PluginManager>,
        mount_points: Arc<MountPointTable>,
        asset_registry: Arc<dyn AssetRegistry>,
        primary_assets: Arc<dyn PrimaryAssetDirectory>,
        loader: Arc<dyn StreamableLoader>,
        shaders: Arc<dyn ShaderLibrary>,
        environment: HostEnvironment,
    ) -> Self {
        Self {
            files,
            plugins,
            mount_points,
            asset_registry,
            primary_assets,
            loader,
            shaders,
            environment,
            exit_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark the engine as shutting down. Shared by every clone.
    pub fn request_engine_exit(&self) {
        self.exit_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_engine_exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for HostServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostServices")
            .field("files", &self.files)
            .field("environment", &self.environment)
            .field("exit_requested", &self.is_engine_exit_requested())
            .finish_non_exhaustive()
    }
}
