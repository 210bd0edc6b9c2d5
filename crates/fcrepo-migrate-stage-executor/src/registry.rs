//! Stage dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use fcrepo_migrate_pipeline::{PipelineError, Stage};

use crate::handler::StageHandler;
use crate::stages::{Export, ExportRest, RemoveOrphans, To5, To6};

/// Maps stage names to their handlers.
#[derive(Clone, Default)]
pub struct StageRegistry {
  handlers: HashMap<Stage, Arc<dyn StageHandler>>,
}

impl StageRegistry {
  /// A registry with every pipeline stage registered.
  pub fn standard() -> Self {
    let mut registry = Self::default();
    registry.register(Arc::new(RemoveOrphans));
    registry.register(Arc::new(Export));
    registry.register(Arc::new(ExportRest));
    registry.register(Arc::new(To5));
    registry.register(Arc::new(To6));
    registry
  }

  /// Register a handler, replacing any previous one for the same stage.
  pub fn register(&mut self, handler: Arc<dyn StageHandler>) {
    self.handlers.insert(handler.stage(), handler);
  }

  pub fn get(&self, stage: Stage) -> Option<Arc<dyn StageHandler>> {
    self.handlers.get(&stage).cloned()
  }

  /// Resolve a stage token as typed on the command line.
  pub fn resolve(&self, token: &str) -> Result<(Stage, Arc<dyn StageHandler>), PipelineError> {
    let stage: Stage = token.parse()?;
    self
      .get(stage)
      .map(|handler| (stage, handler))
      .ok_or_else(|| PipelineError::UnknownStage(token.to_string()))
  }

  pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
    Stage::ALL.iter().copied().filter(|s| self.handlers.contains_key(s))
  }
}
