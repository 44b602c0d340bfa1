use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::actions::Action;
use crate::panel::{PanelId, PanelRegistry, PanelView, StatusPanel, TargetRow};
use crate::tilt::Status;
use crate::watcher::SessionWatcher;

/// Theme colors
pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(32, 186, 49), // Tilt green
            dim: Color::Rgb(100, 100, 100),
            success: Color::Rgb(80, 200, 120),
            warning: Color::Rgb(255, 193, 7),
            error: Color::Rgb(220, 53, 69),
        }
    }
}

impl Theme {
    fn status_color(&self, status: Status) -> Color {
        match status {
            Status::Ok => self.success,
            Status::Pending => self.warning,
            Status::Error => self.error,
        }
    }
}

/// Footer message with its severity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Main application state
pub struct App {
    /// Open panels; the status panel is the only kind
    pub panels: PanelRegistry,
    /// Currently selected target row
    pub list_state: ListState,
    /// Current message to display (info or error)
    pub message: Option<StatusMessage>,
    /// Theme
    pub theme: Theme,
    /// Pending action queue
    pub pending_actions: Vec<Action>,
    watcher: SessionWatcher,
    tx: UnboundedSender<Action>,
}

impl App {
    pub fn new(watcher: SessionWatcher, tx: UnboundedSender<Action>) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        let mut app = Self {
            panels: PanelRegistry::new(),
            list_state,
            message: None,
            theme: Theme::default(),
            pending_actions: Vec::new(),
            watcher,
            tx,
        };
        app.show_status_panel();
        app
    }

    /// Open the status panel, or keep the existing one
    pub fn show_status_panel(&mut self) {
        let watcher = &self.watcher;
        let tx = &self.tx;
        self.panels.get_or_create(PanelId::TILT_STATUS, || {
            let tx = tx.clone();
            let subscription = watcher.subscribe(move |session| {
                let _ = tx.send(Action::SessionUpdated(PanelId::TILT_STATUS, session));
            });
            StatusPanel::with_subscription(subscription)
        });
    }

    fn status_panel(&self) -> Option<&StatusPanel> {
        self.panels.get(PanelId::TILT_STATUS)
    }

    /// Rows of the status panel, empty while waiting or closed
    fn rows(&self) -> Vec<TargetRow> {
        match self.status_panel().map(StatusPanel::view) {
            Some(PanelView::Ready { rows, .. }) => rows,
            _ => Vec::new(),
        }
    }

    /// Get the currently selected row
    pub fn selected_row(&self) -> Option<TargetRow> {
        let mut rows = self.rows();
        match self.list_state.selected() {
            Some(i) if i < rows.len() => Some(rows.swap_remove(i)),
            _ => None,
        }
    }

    /// Take pending actions (drains the queue)
    pub fn take_pending_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_actions)
    }

    /// Handle an action and return whether to quit
    pub fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::KeyPress(key) => self.handle_key(key),
            Action::SessionUpdated(id, session) => {
                if let Some(panel) = self.panels.get_mut(id) {
                    panel.on_session_update(session);
                }
                // Ensure selection is valid
                let len = self.rows().len();
                if let Some(selected) = self.list_state.selected() {
                    if selected >= len && len > 0 {
                        self.list_state.select(Some(len - 1));
                    }
                }
                Ok(false)
            }
            Action::TriggerFailed { resource, error } => {
                self.message = Some(StatusMessage::error(format!(
                    "Failed to trigger {}: {}",
                    resource, error
                )));
                Ok(false)
            }
            Action::Quit => Ok(true),
            _ => Ok(false),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Clear message on any key press
        self.message = None;

        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(true);
            }
            KeyCode::Char('j') | KeyCode::Down => self.next_row(),
            KeyCode::Char('k') | KeyCode::Up => self.previous_row(),
            KeyCode::Char('r') | KeyCode::Enter => self.trigger_selected(),
            KeyCode::Char('s') => self.show_status_panel(),
            KeyCode::Char('x') => {
                self.panels.close(PanelId::TILT_STATUS);
            }
            _ => {}
        }
        Ok(false)
    }

    fn trigger_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        let Some(resource) = row.trigger else {
            self.message = Some(StatusMessage::info(format!(
                "{} has no resource to trigger",
                row.name
            )));
            return;
        };

        let request = self
            .status_panel()
            .and_then(|panel| panel.on_trigger_resource(&resource));
        if let Some(request) = request {
            self.message = Some(StatusMessage::info(format!(
                "Triggered {}",
                request.resource_name
            )));
            self.pending_actions
                .push(Action::TriggerResource(request.resource_name));
        }
    }

    fn next_row(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous_row(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Main content
                Constraint::Length(3), // Footer/status
            ])
            .split(frame.area());

        let view = self.status_panel().map(StatusPanel::view);

        self.render_header(frame, chunks[0], view.as_ref());
        self.render_main(frame, chunks[1], view);
        self.render_footer(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, view: Option<&PanelView>) {
        let mut spans = vec![Span::styled(
            " TiltDeck ",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )];

        match view {
            Some(PanelView::Ready { status, .. }) => {
                spans.push(Span::styled("│ Tilt is ", Style::default().fg(self.theme.dim)));
                spans.push(Span::styled(
                    status.to_string(),
                    Style::default()
                        .fg(self.theme.status_color(*status))
                        .add_modifier(Modifier::BOLD),
                ));
            }
            Some(PanelView::Waiting) => {
                spans.push(Span::styled(
                    "│ Waiting for Tilt",
                    Style::default().fg(self.theme.dim),
                ));
            }
            None => {}
        }

        let title = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(title, area);
    }

    fn render_main(&mut self, frame: &mut Frame, area: Rect, view: Option<PanelView>) {
        let block = Block::default()
            .title(" Tilt Status ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.dim));

        let rows = match view {
            None => {
                let text = Paragraph::new(Line::from(Span::styled(
                    "  Panel closed. Press 's' to show Tilt status.",
                    Style::default().fg(self.theme.dim),
                )))
                .block(block);
                frame.render_widget(text, area);
                return;
            }
            Some(PanelView::Waiting) => {
                let text = Paragraph::new(Line::from(Span::styled(
                    "  Waiting for Tilt API server...",
                    Style::default().fg(self.theme.dim),
                )))
                .block(block);
                frame.render_widget(text, area);
                return;
            }
            Some(PanelView::Ready { rows, .. }) => rows,
        };

        let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);

        let items: Vec<ListItem> = if rows.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "  No targets reported yet.",
                Style::default().fg(self.theme.dim),
            )))]
        } else {
            rows.iter()
                .map(|row| {
                    let color = self.theme.status_color(row.status);
                    let icon = match row.status {
                        Status::Ok => "● ",
                        Status::Pending => "◌ ",
                        Status::Error => "✗ ",
                    };

                    let mut spans = vec![
                        Span::styled(icon, Style::default().fg(color)),
                        Span::styled(
                            format!("{:<width$}  ", row.name, width = name_width),
                            Style::default().fg(self.theme.fg),
                        ),
                        Span::styled(format!("{:<8}", row.status), Style::default().fg(color)),
                    ];
                    if row.trigger.is_some() {
                        spans.push(Span::styled(" ⟳", Style::default().fg(self.theme.accent)));
                    }

                    ListItem::new(Line::from(spans))
                })
                .collect()
        };

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(50, 50, 50))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let help_text = " q: Quit │ j/k: Navigate │ r/Enter: Trigger build │ x: Close panel │ s: Show panel ";

        let content = if let Some(ref msg) = self.message {
            let color = if msg.is_error {
                self.theme.error
            } else {
                self.theme.success
            };
            Line::from(Span::styled(
                format!(" {} ", msg.text),
                Style::default().fg(color),
            ))
        } else {
            Line::from(Span::styled(help_text, Style::default().fg(self.theme.dim)))
        };

        let footer = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(footer, area);
    }
}
