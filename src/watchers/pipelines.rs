use crate::models::ResourceKind;
use crate::watchers::Lifecycle;

/// Pipeline instance lifecycle: the defaults apply unchanged. Segments and
/// manifolds are removed by the cascade when the instance is removed.
pub struct PipelineInstancesWatcher;

impl Lifecycle for PipelineInstancesWatcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::PipelineInstances
    }
}
