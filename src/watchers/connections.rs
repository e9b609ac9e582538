use crate::models::ResourceKind;
use crate::watchers::Lifecycle;

/// Executor lifecycle: the defaults apply unchanged. Disconnection does not
/// flow through here; the session teardown dispatches `connectionsDropOne`
/// directly.
pub struct ConnectionsWatcher;

impl Lifecycle for ConnectionsWatcher {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Connections
    }
}
