//! Main rendering module
//!
//! Handles rendering the complete UI including:
//! - Header with server address and tab bar
//! - Active tab content
//! - Popups and overlays
//! - Status bar

use crate::app::{App, PopupState};
use crate::types::{ChatMessage, EntriesView, JournalEntry, Sender, Tab};
use crate::ui::{theme::Theme, widgets};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

const LOADING_TEXT: &str = "Loading entries...";
const EMPTY_TEXT: &str = "No entries yet. Start writing!";
const FAILED_TEXT: &str =
    "⚠ Failed to load entries from the server. Check if the backend is running.";

/// Main render function - entry point for all UI rendering
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: header, content, status bar
    let layout = Layout::vertical([
        Constraint::Length(3),  // Header + tabs
        Constraint::Min(8),     // Content
        Constraint::Length(1),  // Status bar
    ])
    .split(area);

    render_header(frame, app, layout[0]);
    render_tab_content(frame, app, layout[1]);
    render_status_bar(frame, app, layout[2]);
    render_popups(frame, app, area);
}

/// Render header with server address and tab bar
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let header_block = Block::default()
        .style(theme.block_style())
        .title(format!(" mindfulme · {} ", app.server_url))
        .title_style(theme.title())
        .borders(Borders::BOTTOM)
        .border_style(theme.border());

    frame.render_widget(header_block, area);

    let tab_titles: Vec<Line> = Tab::all()
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let style = if app.active_tab == *tab {
                theme.tab_active()
            } else {
                theme.tab_inactive()
            };
            Line::styled(format!("[{}] {}", i + 1, tab.label()), style)
        })
        .collect();

    let tabs = Tabs::new(tab_titles)
        .select(app.active_tab.index())
        .divider(" │ ")
        .style(theme.text());

    let tabs_area = Rect {
        x: area.x + 2,
        y: area.y + 1,
        width: area.width.saturating_sub(4),
        height: 1,
    };
    frame.render_widget(tabs, tabs_area);
}

/// Only the active tab's panel is drawn
fn render_tab_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.active_tab {
        Tab::Journal => render_journal_tab(frame, app, area),
        Tab::Chat => render_chat_tab(frame, app, area),
        Tab::Settings => render_settings_tab(frame, app, area),
    }
}

/// Render status bar with keybindings
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let hints = match (app.active_tab, app.input_mode) {
        (Tab::Journal, true) => "[Ctrl+S] Save  [Enter] New line  [Esc] Stop typing",
        (Tab::Journal, false) => "[i] Write  [s] Save  [r] Refresh  [j/k] Scroll  [1-3] Tabs  [q] Quit",
        (Tab::Chat, true) => "[Enter] Send  [Esc] Stop typing",
        (Tab::Chat, false) => "[i] Type message  [1-3] Tabs  [q] Quit",
        (Tab::Settings, _) => "[j/k] Navigate  [Enter] Change  [1-3] Tabs  [q] Quit",
    };

    let busy = if app.saves_in_flight > 0 {
        format!("{} saving", widgets::spinner_frame())
    } else {
        String::new()
    };

    widgets::render_status_bar(frame, hints, &busy, theme, area);
}

/// Render popups if active
fn render_popups(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    match &app.popup {
        PopupState::None => {}
        PopupState::Error { title, message } => {
            widgets::render_error_popup(frame, title, message, theme, area);
        }
    }

    // Flash message (success/error feedback)
    if let Some((msg, is_error, _)) = &app.flash_message {
        widgets::render_flash_message(frame, msg, *is_error, theme, area);
    }
}

// === TAB RENDERERS ===

/// Journal tab: entry editor above the list of past entries
fn render_journal_tab(frame: &mut Frame, app: &App, area: Rect) {
    let panels = Layout::vertical([
        Constraint::Length(7),
        Constraint::Min(4),
    ])
    .split(area);

    render_journal_editor(frame, app, panels[0]);
    render_entry_list(frame, app, panels[1]);
}

fn render_journal_editor(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .style(theme.block_style())
        .title(" New Entry ")
        .title_style(if app.input_mode { theme.title() } else { theme.text_dim() })
        .borders(Borders::ALL)
        .border_style(if app.input_mode { theme.border_focused() } else { theme.border() });

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let editor = if app.input_mode {
        Paragraph::new(format!("{}\u{2588}", app.journal_input)).style(theme.text())
    } else if app.journal_input.is_empty() {
        Paragraph::new("How are you feeling today? Press i to start writing.")
            .style(theme.text_dim())
    } else {
        Paragraph::new(app.journal_input.as_str()).style(theme.text())
    };

    // Keep the cursor line in view for long drafts
    let editor = editor.wrap(Wrap { trim: false });
    let scroll = widgets::bottom_scroll(&editor, inner);
    frame.render_widget(editor.scroll((scroll, 0)), inner);
}

fn render_entry_list(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .style(theme.block_style())
        .title(format!(" Past Entries ({}) ", app.entries.len()))
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border_focused());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let placeholder = match &app.entries {
        EntriesView::Loading => Some((LOADING_TEXT, theme.text_dim())),
        EntriesView::Empty => Some((EMPTY_TEXT, theme.text_dim())),
        EntriesView::Failed => Some((FAILED_TEXT, theme.warning())),
        EntriesView::Loaded(_) => None,
    };

    if let Some((text, style)) = placeholder {
        let msg = Paragraph::new(text)
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(msg, inner);
        return;
    }

    if let EntriesView::Loaded(entries) = &app.entries {
        let lines = entry_lines(
            &entries[app.entries_scroll.min(entries.len())..],
            app.config.journal.preview_length,
            theme,
        );
        let list = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(list, inner);
    }
}

/// One line per entry, blank lines in between
pub fn entry_lines(entries: &[JournalEntry], preview_length: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(entries.len() * 2);
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            lines.push(Line::raw(""));
        }
        lines.push(entry_line(entry, preview_length, theme));
    }
    lines
}

/// `date: preview` with the content cut at `preview_length` characters
pub fn entry_line(entry: &JournalEntry, preview_length: usize, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", entry.formatted_date()), theme.entry_date()),
        Span::styled(entry.preview(preview_length).replace('\n', " "), theme.text()),
    ])
}

/// Chat tab: transcript with the input box beneath
fn render_chat_tab(frame: &mut Frame, app: &App, area: Rect) {
    let panels = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(3),
    ])
    .split(area);

    render_transcript(frame, app, panels[0]);
    render_chat_input(frame, app, panels[1]);
}

fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .style(theme.block_style())
        .title(" ZenBot ")
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border_focused());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.transcript.is_empty() && app.replies_pending == 0 {
        let hint = Paragraph::new("Say hello to ZenBot. Press i to start typing.")
            .style(theme.text_dim())
            .alignment(Alignment::Center);
        frame.render_widget(hint, inner);
        return;
    }

    let mut lines: Vec<Line> = app
        .transcript
        .iter()
        .map(|msg| message_line(msg, theme))
        .collect();

    if app.replies_pending > 0 {
        lines.push(Line::styled(
            format!("{} ZenBot is typing…", widgets::spinner_frame()),
            theme.text_dim(),
        ));
    }

    // Auto-scroll to the newest message
    let transcript = Paragraph::new(lines).wrap(Wrap { trim: false });
    let scroll = widgets::bottom_scroll(&transcript, inner);
    frame.render_widget(transcript.scroll((scroll, 0)), inner);
}

fn message_line<'a>(msg: &'a ChatMessage, theme: &Theme) -> Line<'a> {
    let label_style = match msg.sender {
        Sender::User => theme.user_message(),
        Sender::Bot => theme.bot_message(),
    };

    Line::from(vec![
        Span::styled(format!("{}: ", msg.sender.label()), label_style),
        Span::styled(msg.text.as_str(), theme.text()),
    ])
}

fn render_chat_input(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .style(theme.block_style())
        .title(" Message ")
        .title_style(if app.input_mode { theme.title() } else { theme.text_dim() })
        .borders(Borders::ALL)
        .border_style(if app.input_mode { theme.border_focused() } else { theme.border() });

    let input = if app.input_mode {
        Paragraph::new(format!("{}\u{2588}", app.chat_input)).style(theme.text())
    } else {
        Paragraph::new(app.chat_input.as_str()).style(theme.text())
    };

    frame.render_widget(input.block(block), area);
}

/// Settings tab
fn render_settings_tab(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    let block = Block::default()
        .style(theme.block_style())
        .title(" Settings ")
        .title_style(theme.title())
        .borders(Borders::ALL)
        .border_style(theme.border_focused());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let preview = format!("{} chars", app.config.journal.preview_length);
    let settings = [
        ("Theme", app.config.theme.as_str()),
        ("Preview Length", preview.as_str()),
    ];

    let items: Vec<ListItem> = settings
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let style = if i == app.settings_selected {
                theme.selected()
            } else {
                theme.text()
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<24}", label), style),
                Span::styled(format!("[{}]", value), Style::default().fg(theme.accent)),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items), inner);

    // Paths at bottom
    let config_path = crate::config::Config::path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "Unknown".into());
    let log_path = crate::logging::log_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "Unknown".into());

    let info_area = Rect {
        x: inner.x,
        y: inner.y + inner.height.saturating_sub(3),
        width: inner.width,
        height: 3.min(inner.height),
    };
    let info = Paragraph::new(vec![
        Line::raw(format!("Server: {}", app.server_url)),
        Line::raw(format!("Config: {}", config_path)),
        Line::raw(format!("Log:    {}", log_path)),
    ])
    .style(theme.text_dim());
    frame.render_widget(info, info_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MindfulApi};
    use crate::config::Config;
    use crate::types::SavedEntry;
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct IdleApi;

    #[async_trait]
    impl MindfulApi for IdleApi {
        async fn list_entries(&self) -> Result<Vec<JournalEntry>, ApiError> {
            Ok(Vec::new())
        }

        async fn save_entry(&self, _content: &str) -> Result<SavedEntry, ApiError> {
            Err(ApiError::Rejected("read only".into()))
        }

        async fn chat(&self, _message: &str) -> Result<String, ApiError> {
            Ok(String::new())
        }
    }

    fn test_app() -> App {
        let (tx, _rx) = mpsc::channel(1);
        App::new(Config::default(), "http://127.0.0.1:5000".into(), Arc::new(IdleApi), tx)
    }

    fn draw(app: &App) -> String {
        draw_sized(app, 100, 30)
    }

    fn draw_sized(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    /// `count` words of 28 chars each, too long for two to share a 38-column row
    fn long_words(count: usize) -> String {
        (0..count)
            .map(|i| char::from(b'a' + i as u8).to_string().repeat(28))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn entry(date: &str, content: &str) -> JournalEntry {
        JournalEntry { date: date.into(), content: content.into() }
    }

    #[test]
    fn test_journal_empty_state() {
        let mut app = test_app();
        app.entries = EntriesView::Empty;

        let screen = draw(&app);
        assert!(screen.contains(EMPTY_TEXT));
        assert!(screen.contains("Past Entries (0)"));
    }

    #[test]
    fn test_journal_failed_state() {
        let mut app = test_app();
        app.entries = EntriesView::Failed;

        let screen = draw(&app);
        assert!(screen.contains("Failed to load entries"));
    }

    #[test]
    fn test_only_active_panel_rendered() {
        let mut app = test_app();
        app.entries = EntriesView::Empty;

        let journal = draw(&app);
        assert!(journal.contains("Past Entries"));
        assert!(!journal.contains("Say hello to ZenBot"));

        app.active_tab = Tab::Chat;
        let chat = draw(&app);
        assert!(chat.contains("Say hello to ZenBot"));
        assert!(!chat.contains("Past Entries"));
    }

    #[test]
    fn test_entry_lines_truncate_each_entry() {
        let theme = Theme::gruvbox();
        let long = "x".repeat(400);
        let entries = vec![
            entry("2024-03-05 14:07:09", &long),
            entry("2024-03-04 09:00:00", "short"),
            entry("2024-03-03 08:00:00", "line one\nline two"),
        ];

        let lines = entry_lines(&entries, 300, &theme);
        let texts: Vec<String> = lines.iter().map(line_text).filter(|t| !t.is_empty()).collect();

        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0], format!("05.03.24 14:07: {}...", "x".repeat(300)));
        assert_eq!(texts[1], "04.03.24 09:00: short");
        assert_eq!(texts[2], "03.03.24 08:00: line one line two");
    }

    #[test]
    fn test_loaded_entries_rendered() {
        let mut app = test_app();
        app.entries = EntriesView::Loaded(vec![
            entry("2024-03-05 14:07:09", "grateful for tea"),
            entry("2024-03-04 09:00:00", "long walk"),
        ]);

        let screen = draw(&app);
        assert!(screen.contains("Past Entries (2)"));
        assert!(screen.contains("grateful for tea"));
        assert!(screen.contains("long walk"));
    }

    #[test]
    fn test_transcript_rendered() {
        let mut app = test_app();
        app.active_tab = Tab::Chat;
        app.transcript = vec![ChatMessage::user("hi"), ChatMessage::bot("Hello! I'm ZenBot.")];
        app.replies_pending = 1;

        let screen = draw(&app);
        assert!(screen.contains("You: hi"));
        assert!(screen.contains("ZenBot: Hello! I'm ZenBot."));
        assert!(screen.contains("ZenBot is typing"));
    }

    #[test]
    fn test_transcript_keeps_newest_message_visible_on_narrow_terminal() {
        let mut app = test_app();
        app.active_tab = Tab::Chat;
        app.transcript = (0..6).map(|_| ChatMessage::bot(long_words(6))).collect();
        app.transcript.push(ChatMessage::bot("NEWESTMARKER"));

        let screen = draw_sized(&app, 40, 30);
        assert!(screen.contains("ZenBot: NEWESTMARKER"));
    }

    #[test]
    fn test_editor_keeps_cursor_visible_on_narrow_terminal() {
        let mut app = test_app();
        app.entries = EntriesView::Empty;
        app.input_mode = true;
        app.journal_input = format!("{} TAILMARK", long_words(10));

        let screen = draw_sized(&app, 40, 30);
        assert!(screen.contains("TAILMARK\u{2588}"));
    }

    #[test]
    fn test_error_popup_rendered() {
        let mut app = test_app();
        app.entries = EntriesView::Empty;
        app.popup = PopupState::Error {
            title: "Save Failed".into(),
            message: "Error saving entry: disk full".into(),
        };

        let screen = draw(&app);
        assert!(screen.contains("Save Failed"));
        assert!(screen.contains("disk full"));
    }
}
