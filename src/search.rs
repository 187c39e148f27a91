//! One-call entry point: pick a backend, run it, wrap the hits

use crate::adapter::ToolAdapterExt;
use crate::backends::{BackendArgs, BackendRegistry, BackendSelector};
use crate::config::SearchConfig;
use crate::context::ProjectContext;
use crate::error::Result;
use crate::result_set::ResultSet;
use crate::types::SearchRequest;

/// Everything needed to turn a request into a result
pub struct ReferenceFinder {
    registry: BackendRegistry,
    selector: BackendSelector,
    config: SearchConfig,
}

impl ReferenceFinder {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            registry: BackendRegistry::with_defaults(),
            selector: BackendSelector::new(),
            config,
        }
    }

    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_selector(mut self, selector: BackendSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Backend name the configured preference resolves to for `context`
    pub fn backend_name(&self, context: &ProjectContext) -> String {
        self.selector.resolve(&self.config.backend, context)
    }

    /// `Ok(None)` when the backend ran fine but found nothing
    pub fn find(
        &self,
        request: &SearchRequest,
        context: &ProjectContext,
    ) -> Result<Option<ResultSet>> {
        let name = self.backend_name(context);
        let adapter = self.registry.create(
            &name,
            BackendArgs {
                request: request.clone(),
                context: context.clone(),
                config: self.config.clone(),
            },
        )?;
        log::info!(
            "searching {} `{}` ({} scope) with {}",
            request.query_kind(),
            request.query(),
            request.scope(),
            adapter.name()
        );
        adapter.get_result()
    }
}

/// [`ReferenceFinder::find`] with the default registry and selector
pub fn find_references(
    request: &SearchRequest,
    context: &ProjectContext,
    config: &SearchConfig,
) -> Result<Option<ResultSet>> {
    ReferenceFinder::new(config.clone()).find(request, context)
}
