use std::sync::Arc;

use nt_core::{ArticleContext, Result};
use nt_inference::{AnalysisSettings, ArticleAnalyzer, ModelGateway};

/// Shared by every request; each request builds its own analyzer.
pub struct AppState {
    pub gateway: Arc<ModelGateway>,
    pub settings: AnalysisSettings,
}

impl AppState {
    pub fn new(gateway: Arc<ModelGateway>, settings: AnalysisSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn analyzer(&self, article: &str, entity: Option<String>) -> Result<ArticleAnalyzer> {
        let context = ArticleContext::new(article, entity)?;
        Ok(ArticleAnalyzer::new(
            context,
            self.gateway.clone(),
            self.settings.clone(),
        ))
    }
}
