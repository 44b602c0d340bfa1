use std::collections::HashMap;
use tracing::{debug, info};

use crate::tilt::{aggregate_status, target_status, Session, Status};
use crate::watcher::Subscription;

/// Identifies a panel in the [`PanelRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelId(pub &'static str);

impl PanelId {
    pub const TILT_STATUS: PanelId = PanelId("tiltStatus");
}

/// One row of the status table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRow {
    pub name: String,
    pub status: Status,
    /// Resource to rebuild when this row is triggered
    pub trigger: Option<String>,
}

/// What the panel should show right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelView {
    /// No session has been observed yet
    Waiting,
    Ready { status: Status, rows: Vec<TargetRow> },
}

/// A request to rebuild a resource, to be sent by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    pub resource_name: String,
}

/// Panel state for one Tilt session
#[derive(Default)]
pub struct StatusPanel {
    current_session: Option<Session>,
    /// Held so the panel stops receiving updates once it is closed
    subscription: Option<Subscription>,
}

impl StatusPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(subscription: Subscription) -> Self {
        Self {
            current_session: None,
            subscription: Some(subscription),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.current_session.as_ref()
    }

    pub fn on_session_update(&mut self, session: Option<Session>) {
        self.current_session = session;
    }

    /// Returns the request to dispatch, or `None` if no session is loaded
    pub fn on_trigger_resource(&self, resource_name: &str) -> Option<TriggerRequest> {
        if self.current_session.is_none() {
            debug!(resource = resource_name, "ignoring trigger without a session");
            return None;
        }
        Some(TriggerRequest {
            resource_name: resource_name.to_string(),
        })
    }

    pub fn view(&self) -> PanelView {
        let Some(session) = &self.current_session else {
            return PanelView::Waiting;
        };

        let rows = session
            .targets()
            .iter()
            .map(|t| TargetRow {
                name: t.name.clone(),
                status: target_status(t),
                trigger: t.trigger_resource().map(str::to_string),
            })
            .collect();

        PanelView::Ready {
            status: aggregate_status(session),
            rows,
        }
    }
}

/// Owns every open panel; at most one panel per id.
#[derive(Default)]
pub struct PanelRegistry {
    panels: HashMap<PanelId, StatusPanel>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the panel for `id`, creating it with `create` the first time
    pub fn get_or_create<F>(&mut self, id: PanelId, create: F) -> &mut StatusPanel
    where
        F: FnOnce() -> StatusPanel,
    {
        self.panels.entry(id).or_insert_with(|| {
            info!(panel = id.0, "opening panel");
            create()
        })
    }

    pub fn get(&self, id: PanelId) -> Option<&StatusPanel> {
        self.panels.get(&id)
    }

    pub fn get_mut(&mut self, id: PanelId) -> Option<&mut StatusPanel> {
        self.panels.get_mut(&id)
    }

    /// Close and drop the panel, ending its subscription
    pub fn close(&mut self, id: PanelId) -> bool {
        let closed = self.panels.remove(&id).is_some();
        if closed {
            info!(panel = id.0, "closed panel");
        }
        closed
    }

    pub fn is_open(&self, id: PanelId) -> bool {
        self.panels.contains_key(&id)
    }
}
