//! Status bar widget - mode indicator, command line and messages

use crate::app::MessageType;
use crate::theme::Theme;
use aura_input::Mode;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Widget for displaying the status bar with mode and command input
pub struct StatusBarWidget<'a> {
    mode: Mode,
    command_buffer: &'a str,
    message: Option<&'a str>,
    message_type: MessageType,
    theme: &'a Theme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode: Mode, command_buffer: &'a str, theme: &'a Theme) -> Self {
        Self {
            mode,
            command_buffer,
            message: None,
            message_type: MessageType::Info,
            theme,
        }
    }

    pub fn message(mut self, msg: Option<&'a str>, msg_type: MessageType) -> Self {
        self.message = msg;
        self.message_type = msg_type;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let chunks = Layout::horizontal([
            Constraint::Length(10), // Mode indicator
            Constraint::Min(20),    // Command/message area
            Constraint::Length(36), // Help hint
        ])
        .split(area);

        let mode_line = Line::from(vec![
            Span::styled("[", self.theme.dim()),
            Span::styled(self.mode.display_name(), self.theme.highlight()),
            Span::styled("]", self.theme.dim()),
        ]);
        Paragraph::new(mode_line)
            .style(self.theme.normal())
            .render(chunks[0], buf);

        let content = if self.mode == Mode::Command {
            Line::from(vec![
                Span::styled(":", self.theme.accent()),
                Span::styled(self.command_buffer, self.theme.normal()),
                Span::styled("█", self.theme.accent()), // Cursor
            ])
        } else if let Some(msg) = self.message {
            let msg_style = match self.message_type {
                MessageType::Info => self.theme.dim(),
                MessageType::Success => self.theme.accent(),
                MessageType::Warning => self.theme.normal().fg(self.theme.warning),
                MessageType::Error => self.theme.normal().fg(self.theme.danger),
            };
            Line::from(Span::styled(msg, msg_style))
        } else {
            Line::from(Span::styled("Ready. Press : for commands", self.theme.dim()))
        };
        Paragraph::new(content)
            .style(self.theme.normal())
            .render(chunks[1], buf);

        let help = match self.mode {
            Mode::Normal => "spc:play n:next 1-4:mode t:theme m:mic",
            Mode::Command => "Enter:run  Esc:cancel",
        };
        Paragraph::new(Line::from(Span::styled(help, self.theme.dim())))
            .style(self.theme.normal())
            .render(chunks[2], buf);
    }
}
