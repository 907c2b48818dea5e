//! Several providers viewed as one.

use std::sync::Arc;

use tracing::warn;

use super::{PackagePathMap, ProviderResult, UgcProvider};

/// Merges the installed paths of its members.
///
/// Later members win path collisions. Disabled members contribute nothing.
#[derive(Default)]
pub struct CompositeProvider {
    providers: Vec<Arc<dyn UgcProvider>>,
}

impl CompositeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn UgcProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl UgcProvider for CompositeProvider {
    /// Initialise every member; the first error is returned after all have run.
    fn initialize(&self) -> ProviderResult<()> {
        let mut first_error = None;
        for provider in &self.providers {
            if let Err(e) = provider.initialize() {
                warn!(error = %e, "UGC provider failed to initialize");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn deinitialize(&self) -> ProviderResult<()> {
        let mut first_error = None;
        for provider in &self.providers {
            if let Err(e) = provider.deinitialize() {
                warn!(error = %e, "UGC provider failed to deinitialize");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn is_enabled(&self) -> bool {
        self.providers.iter().any(|p| p.is_enabled())
    }

    fn installed_paths(&self) -> PackagePathMap {
        self.providers
            .iter()
            .filter(|p| p.is_enabled())
            .fold(PackagePathMap::new(), |acc, p| acc + p.installed_paths())
    }
}
