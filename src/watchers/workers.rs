use crate::models::ResourceKind;
use crate::watchers::Lifecycle;

/// Worker lifecycle: the defaults apply unchanged.
pub struct WorkersWatcher;

impl Lifecycle for WorkersWatcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Workers
    }
}
