use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::actions::Action;
use crate::tilt::TiltClient;

/// Send a trigger without waiting on it. The outcome is only logged, and a
/// failure is reported back as [`Action::TriggerFailed`] for the footer.
pub fn spawn_trigger(
    client: TiltClient,
    resource: String,
    tx: UnboundedSender<Action>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match client.trigger_build(&resource).await {
            Ok(()) => info!(resource = %resource, "triggered build"),
            Err(e) => {
                warn!(resource = %resource, error = %e, "failed to trigger build");
                let _ = tx.send(Action::TriggerFailed {
                    resource,
                    error: e.to_string(),
                });
            }
        }
    })
}
