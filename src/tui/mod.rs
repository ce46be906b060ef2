//! TUI interface — ratatui panes: Sieve editor on the left, compiled worker
//! (or the compile fault) on the right, status bar below.
//!
//! The App holds view state only. Compile results live in the controller's
//! [`AppState`](crate::state::AppState); every frame is drawn from it.

pub mod editor;
pub mod fault_log;
pub mod help;
pub mod keybindings;
pub mod layout;
pub mod status;
pub mod syntax;
pub mod theme;
pub mod viewer;

pub use editor::Editor;
pub use fault_log::FaultLog;
pub use help::HelpScreen;
pub use keybindings::{map_key, Action};
pub use layout::FocusPanel;
pub use status::StatusInfo;
pub use syntax::Language;
pub use theme::Theme;
pub use viewer::Viewer;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info, trace};

use crate::config::PlaygroundConfig;
use crate::controller::Controller;
use crate::jsfmt::JsFormatter;
use crate::pipeline::{CompileFault, CompilePipeline};
use crate::sieve::SieveCompiler;
use crate::state::{Phase, RequestId, RunOutcome};

/// How long the loop waits for a key before polling for resolved runs.
const TICK: Duration = Duration::from_millis(30);

pub type PlaygroundController = Controller<SieveCompiler, JsFormatter>;

/// The main TUI application state.
pub struct App {
    pub editor: Editor,
    pub viewer: Viewer,
    pub focus: FocusPanel,
    pub help_screen: HelpScreen,
    pub fault_log: FaultLog,
    pub fault_log_visible: bool,
    pub theme: Theme,
    pub should_quit: bool,
    controller: PlaygroundController,
    /// Run whose outcome was last copied into the viewer or fault log.
    synced: Option<RequestId>,
}

impl App {
    /// Build the production app from config and mount it with `source`.
    pub fn new(source: &str, config: &PlaygroundConfig) -> Self {
        let controller = Controller::new(
            CompilePipeline::sieve(config.generate_opts()),
            config.stale_results,
        );
        Self::with_controller(source, controller, theme::from_name(config.theme))
    }

    pub fn with_controller(source: &str, controller: PlaygroundController, theme: Theme) -> Self {
        let mut app = Self {
            editor: Editor::new(source),
            viewer: Viewer::new(Language::JavaScript),
            focus: FocusPanel::Editor,
            help_screen: HelpScreen::new(),
            fault_log: FaultLog::default(),
            fault_log_visible: false,
            theme,
            should_quit: false,
            controller,
            synced: None,
        };
        app.controller.mount(&app.editor.content());
        app
    }

    pub fn controller(&self) -> &PlaygroundController {
        &self.controller
    }

    fn overlay_visible(&self) -> bool {
        self.help_screen.visible || self.fault_log_visible
    }

    /// Handle an action from a key binding.
    pub fn handle_action(&mut self, action: Action) {
        trace!(?action, "action");
        let changed = match action {
            Action::Quit => {
                self.should_quit = true;
                false
            }
            Action::CycleFocus => {
                self.focus = self.focus.next();
                false
            }
            Action::ToggleHelp => {
                self.help_screen.toggle();
                false
            }
            Action::ToggleFaultLog => {
                self.fault_log_visible = !self.fault_log_visible;
                false
            }
            Action::CycleTheme => {
                self.theme = theme::cycle_theme(&self.theme, &theme::all_builtins());
                false
            }
            Action::Escape => {
                if self.fault_log_visible {
                    self.fault_log_visible = false;
                } else if self.help_screen.visible {
                    self.help_screen.hide();
                } else {
                    self.focus = FocusPanel::Editor;
                }
                false
            }
            Action::EditorInsert(c) => self.editor.insert_char(c),
            Action::EditorNewline => self.editor.newline(),
            Action::EditorBackspace => self.editor.backspace(),
            Action::EditorDelete => self.editor.delete(),
            Action::EditorLeft => {
                self.editor.move_left();
                false
            }
            Action::EditorRight => {
                self.editor.move_right();
                false
            }
            Action::EditorUp => {
                self.editor.move_up();
                false
            }
            Action::EditorDown => {
                self.editor.move_down();
                false
            }
            Action::EditorHome => {
                self.editor.home();
                false
            }
            Action::EditorEnd => {
                self.editor.end();
                false
            }
            Action::ScrollUp => {
                if self.help_screen.visible {
                    self.help_screen.scroll_up();
                } else {
                    self.viewer.scroll_up(1);
                }
                false
            }
            Action::ScrollDown => {
                if self.help_screen.visible {
                    self.help_screen.scroll_down(10);
                } else {
                    self.viewer.scroll_down(1);
                }
                false
            }
            Action::PageUp => {
                self.viewer.page_up();
                false
            }
            Action::PageDown => {
                self.viewer.page_down();
                false
            }
        };

        if changed {
            self.controller.on_change(&self.editor.content());
        }
    }

    /// Apply resolved runs and refresh the views that depend on them.
    pub fn tick(&mut self) -> usize {
        let applied = self.controller.poll();
        if applied > 0 {
            self.sync_outcome();
        }
        applied
    }

    /// Block until a run resolves (tests and scripted sessions).
    pub fn wait_for_resolution(&mut self, timeout: Duration) -> bool {
        let resolved = self.controller.wait_for_resolution(timeout);
        if resolved {
            self.sync_outcome();
        }
        resolved
    }

    fn sync_outcome(&mut self) {
        let Some(outcome) = &self.controller.state().outcome else {
            return;
        };
        let request = outcome.request();
        if request == self.synced {
            return;
        }
        self.synced = request;
        match outcome {
            RunOutcome::Artifact(artifact) => self.viewer.set_content(&artifact.code),
            RunOutcome::Fault(fault) => {
                self.fault_log.push(fault.request, fault.message.clone());
            }
        }
    }

    /// Context-sensitive hint for the status bar.
    pub fn context_hint(&self) -> &str {
        if self.fault_log_visible {
            return "Ctrl-L/Esc:close fault log";
        }
        if self.help_screen.visible {
            return "F1/Esc:close help  Up/Down:scroll";
        }
        match self.focus {
            FocusPanel::Editor => "Tab:output  F1:help  Ctrl-L:faults  Ctrl-Q:quit",
            FocusPanel::Output => "Up/Down/PgUp/PgDn:scroll  Tab:script  Esc:back",
        }
    }

    /// Draw the UI.
    pub fn draw(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(size);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

        self.draw_editor(frame, panes[0]);
        self.draw_output(frame, panes[1]);
        self.draw_status(frame, chunks[1]);

        if self.fault_log_visible {
            self.draw_fault_log(frame, size);
        }
        if self.help_screen.visible {
            self.draw_help(frame, size);
        }
    }

    fn border_style(&self, panel: FocusPanel) -> Style {
        if self.focus == panel {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        }
    }

    fn draw_editor(&mut self, frame: &mut Frame, area: Rect) {
        let inner_height = area.height.saturating_sub(2) as usize;
        self.editor.set_viewport_height(inner_height);
        let scroll_offset = self.editor.scroll_offset();

        let theme = &self.theme;
        let lines: Vec<Line> = self
            .editor
            .lines()
            .iter()
            .enumerate()
            .skip(scroll_offset)
            .take(inner_height)
            .map(|(i, line)| {
                let mut spans = vec![Span::styled(
                    format!("{:3} ", i + 1),
                    Style::default().fg(theme.editor_line_number),
                )];
                spans.extend(syntax::highlight_line(line, Language::Sieve, theme));
                Line::from(spans)
            })
            .collect();

        let block = Block::default()
            .title(" Sieve ")
            .borders(Borders::ALL)
            .border_style(self.border_style(FocusPanel::Editor));
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if self.focus == FocusPanel::Editor && !self.overlay_visible() {
            let (row, col) = self.editor.cursor();
            // +1 for border, +4 for line number
            let x = area.x + 1 + 4 + col as u16;
            let y = area.y + 1 + (row - scroll_offset) as u16;
            if x < area.x + area.width && y < area.y + area.height {
                frame.set_cursor_position((x, y));
            }
        }
    }

    fn draw_output(&mut self, frame: &mut Frame, area: Rect) {
        let state = self.controller.state();
        if let Some(fault) = state.fault() {
            draw_fault(frame, area, fault, &self.theme);
            return;
        }

        let block = Block::default()
            .title(" Worker ")
            .borders(Borders::ALL)
            .border_style(self.border_style(FocusPanel::Output));

        if state.artifact().is_none() {
            let placeholder = Paragraph::new("compiling…")
                .style(Style::default().fg(self.theme.editor_line_number))
                .block(block);
            frame.render_widget(placeholder, area);
            return;
        }

        let inner_height = area.height.saturating_sub(2) as usize;
        self.viewer.set_viewport_height(inner_height);
        let theme = &self.theme;
        let language = self.viewer.language();
        let lines: Vec<Line> = self
            .viewer
            .lines()
            .iter()
            .enumerate()
            .skip(self.viewer.scroll_offset())
            .take(inner_height)
            .map(|(i, line)| {
                let mut spans = vec![Span::styled(
                    format!("{:4} ", i + 1),
                    Style::default().fg(theme.editor_line_number),
                )];
                spans.extend(syntax::highlight_line(line, language, theme));
                Line::from(spans)
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let theme = &self.theme;
        let info = StatusInfo::from_state(self.controller.state());
        let phase_color = match info.phase {
            Phase::Success => theme.status_ok,
            Phase::Failed => theme.status_err,
            Phase::Compiling => theme.status_busy,
            Phase::Idle => theme.editor_line_number,
        };

        let mut spans = vec![
            Span::styled(
                info.phase_display(),
                Style::default().fg(phase_color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                " runs:{} | {} | {} ",
                info.in_flight,
                info.policy_display(),
                theme.name
            )),
        ];
        if let Some(lag) = info.lag_display() {
            spans.push(Span::styled(lag, Style::default().fg(theme.status_busy)));
        }
        if !self.fault_log.is_empty() {
            spans.push(Span::raw(format!(" faults:{} ", self.fault_log.len())));
        }
        spans.push(Span::styled(
            format!(" {} ", self.context_hint()),
            Style::default().fg(theme.editor_line_number),
        ));

        let paragraph = Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bg).fg(theme.status_fg));
        frame.render_widget(paragraph, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let overlay = centered(area, 70, 70, 50, 15);
        let block = Block::default()
            .style(Style::default().bg(self.theme.overlay_bg))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused))
            .title(" Help — F1 or Esc to close ");
        let inner = block.inner(overlay);
        frame.render_widget(Clear, overlay);
        frame.render_widget(block, overlay);

        let lines: Vec<Line> = self
            .help_screen
            .lines()
            .iter()
            .skip(self.help_screen.scroll_offset)
            .take(inner.height as usize)
            .map(|hl| {
                let color = if hl.is_header {
                    self.theme.help_key
                } else {
                    self.theme.help_desc
                };
                Line::from(Span::styled(&hl.text, Style::default().fg(color)))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_fault_log(&self, frame: &mut Frame, area: Rect) {
        let overlay = centered(area, 70, 50, 50, 10);
        let block = Block::default()
            .style(Style::default().bg(self.theme.overlay_bg))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.fault_border))
            .title(" Fault Log — Ctrl-L or Esc to close ");
        let inner = block.inner(overlay);
        frame.render_widget(Clear, overlay);
        frame.render_widget(block, overlay);

        if self.fault_log.is_empty() {
            let paragraph = Paragraph::new("(no faults recorded)")
                .style(Style::default().fg(self.theme.editor_line_number));
            frame.render_widget(paragraph, inner);
            return;
        }

        let theme = &self.theme;
        let lines: Vec<Line> = self
            .fault_log
            .recent(inner.height as usize)
            .into_iter()
            .map(|entry| {
                let elapsed = entry
                    .timestamp
                    .elapsed()
                    .map(|d| format!("{:.0}s ago", d.as_secs_f64()))
                    .unwrap_or_else(|_| "?".to_string());
                Line::from(vec![
                    Span::styled(
                        format!("[{elapsed}] "),
                        Style::default().fg(theme.editor_line_number),
                    ),
                    Span::styled(&entry.message, Style::default().fg(theme.fault_fg)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    /// Run the TUI event loop.
    pub fn run(
        &mut self,
        terminal: &mut ratatui::Terminal<impl ratatui::backend::Backend>,
    ) -> io::Result<()> {
        info!("playground started");
        while !self.should_quit {
            terminal
                .draw(|frame| self.draw(frame))
                .map_err(|e| io::Error::other(e.to_string()))?;

            if event::poll(TICK)? {
                if let CrosstermEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if let Some(action) = map_key(key, self.focus, self.overlay_visible()) {
                            self.handle_action(action);
                        }
                    }
                }
            }

            let applied = self.tick();
            if applied > 0 {
                debug!(applied, phase = %self.controller.state().phase, "runs resolved");
            }
        }
        info!("playground closed");
        Ok(())
    }
}

/// The error banner drawn in place of the output pane.
///
/// Shows a fixed heading and the fault message verbatim; origin and detail
/// are never rendered.
pub fn draw_fault(frame: &mut Frame, area: Rect, fault: &CompileFault, theme: &Theme) {
    let block = Block::default()
        .title(" Failed to compile ")
        .title_style(
            Style::default()
                .fg(theme.fault_border)
                .add_modifier(Modifier::BOLD),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.fault_border));
    let paragraph = Paragraph::new(fault.message.as_str())
        .style(Style::default().fg(theme.fault_fg))
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

/// A rectangle of `pw`% × `ph`% of `area`, at least `min_w` × `min_h`, centered.
fn centered(area: Rect, pw: u16, ph: u16, min_w: u16, min_h: u16) -> Rect {
    let width = (area.width * pw / 100).max(min_w).min(area.width);
    let height = (area.height * ph / 100).max(min_h).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
