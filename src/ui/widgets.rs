//! Custom TUI widgets

use super::ThemeColors;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Status of a displayed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Ok,
    Warning,
    Error,
    Info,
}

/// A single label/value row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatEntry {
    pub label: String,
    pub value: String,
    pub status: EntryStatus,
}

impl StatEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>, status: EntryStatus) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            status,
        }
    }

    pub fn ok(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Ok)
    }

    pub fn warning(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Warning)
    }

    pub fn error(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Error)
    }

    pub fn info(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, EntryStatus::Info)
    }
}

/// Widget for displaying label/value rows
pub struct StatsPanel<'a> {
    entries: &'a [StatEntry],
    title: &'a str,
    colors: ThemeColors,
}

impl<'a> StatsPanel<'a> {
    pub fn new(entries: &'a [StatEntry], title: &'a str, colors: ThemeColors) -> Self {
        Self {
            entries,
            title,
            colors,
        }
    }

    fn status_color(&self, status: EntryStatus) -> Color {
        match status {
            EntryStatus::Ok => self.colors.green,
            EntryStatus::Warning => self.colors.yellow,
            EntryStatus::Error => self.colors.red,
            EntryStatus::Info => self.colors.cyan,
        }
    }

    fn status_symbol(status: EntryStatus) -> &'static str {
        match status {
            EntryStatus::Ok => "[OK]",
            EntryStatus::Warning => "[!!]",
            EntryStatus::Error => "[XX]",
            EntryStatus::Info => "[--]",
        }
    }
}

impl<'a> Widget for StatsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.colors.dim));

        let inner = block.inner(area);
        block.render(area, buf);

        for (row, entry) in self.entries.iter().enumerate() {
            if row as u16 >= inner.height {
                break;
            }

            let color = self.status_color(entry.status);
            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", Self::status_symbol(entry.status)),
                    Style::default().fg(color),
                ),
                Span::styled(
                    format!("{}: ", entry.label),
                    Style::default()
                        .fg(self.colors.fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(entry.value.as_str(), Style::default().fg(color)),
            ]);

            buf.set_line(inner.x, inner.y + row as u16, &line, inner.width);
        }
    }
}

/// Widget for the help screen
pub struct HelpPanel {
    colors: ThemeColors,
}

impl HelpPanel {
    pub fn new(colors: ThemeColors) -> Self {
        Self { colors }
    }
}

impl Widget for HelpPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Help - Keyboard Debouncer ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.colors.cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let help_text = [
            "",
            " CONTROLS",
            " -----------",
            " e                : Enable/disable debouncing",
            " + / -            : Threshold +5 / -5 ms",
            " ] / [            : Threshold +1 / -1 ms",
            " r                : Reset suppressed counter",
            " R                : Retry arming keyboard capture",
            " x                : Export report to JSON",
            " Tab / Shift+Tab  : Switch view",
            " ?                : Show this help",
            " q / Esc          : Quit",
            "",
            " ABOUT",
            " -----------",
            " Worn switches can fire several presses for one keystroke.",
            " Repeats of the same key and direction closer together than",
            " the threshold are dropped before applications see them.",
            "",
            " Capture needs read access to /dev/input and /dev/uinput",
            " (run with sudo or add the user to the 'input' group).",
        ];

        for (i, line) in help_text.iter().enumerate() {
            if i as u16 >= inner.height {
                break;
            }
            let style = if line.contains("---") {
                Style::default().fg(self.colors.dim)
            } else if line
                .chars()
                .nth(1)
                .is_some_and(|c| c.is_ascii_uppercase())
                && line.trim().chars().all(|c| c.is_ascii_uppercase())
            {
                Style::default()
                    .fg(self.colors.yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.colors.fg)
            };
            buf.set_string(inner.x, inner.y + i as u16, line, style);
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    status: &'a str,
    view: &'a str,
    elapsed: &'a str,
    suppressed: u64,
    message: Option<&'a str>,
}

impl<'a> StatusBar<'a> {
    pub fn new(status: &'a str, view: &'a str, elapsed: &'a str, suppressed: u64) -> Self {
        Self {
            status,
            view,
            elapsed,
            suppressed,
            message: None,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg_style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            buf.set_string(x, area.y, " ", bg_style);
        }

        let left = format!(" {} | {} ", self.status, self.view);
        buf.set_string(area.x, area.y, &left, bg_style.add_modifier(Modifier::BOLD));

        if let Some(msg) = self.message {
            let msg_style = Style::default().bg(Color::DarkGray).fg(Color::Yellow);
            let msg_x = area.x + (area.width / 2).saturating_sub(msg.len() as u16 / 2);
            buf.set_string(msg_x, area.y, msg, msg_style);
        }

        let right = format!(" {} | Suppressed: {} ", self.elapsed, self.suppressed);
        let right_x = area.x + area.width.saturating_sub(right.len() as u16);
        buf.set_string(right_x, area.y, &right, bg_style);
    }
}

/// Tab bar widget
pub struct TabBar<'a> {
    tabs: &'a [&'a str],
    selected: usize,
}

impl<'a> TabBar<'a> {
    pub fn new(tabs: &'a [&'a str], selected: usize) -> Self {
        Self { tabs, selected }
    }
}

impl<'a> Widget for TabBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut x = area.x;

        for (i, tab) in self.tabs.iter().enumerate() {
            let style = if i == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            };

            let label = format!(" {} ", tab);
            let width = label.len() as u16;
            if x + width > area.x + area.width {
                break;
            }
            buf.set_string(x, area.y, &label, style);
            x += width;

            if i + 1 < self.tabs.len() && x < area.x + area.width {
                buf.set_string(x, area.y, "|", Style::default().fg(Color::DarkGray));
                x += 1;
            }
        }

        for fill_x in x..area.x + area.width {
            buf.set_string(fill_x, area.y, " ", Style::default().bg(Color::DarkGray));
        }
    }
}
