use crossterm::event::KeyEvent;

use crate::panel::PanelId;
use crate::tilt::Session;

/// Actions that can be dispatched through the application
#[derive(Debug, Clone)]
pub enum Action {
    /// A key was pressed
    KeyPress(KeyEvent),
    /// A new session snapshot for a panel (`None` while Tilt is unreachable)
    SessionUpdated(PanelId, Option<Session>),
    /// Ask Tilt to rebuild a resource
    TriggerResource(String),
    /// A trigger request was rejected or could not be sent
    TriggerFailed { resource: String, error: String },
    /// Request to quit the application
    Quit,
}
