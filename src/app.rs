//! Application state and event handling
//!
//! This is the core of mindfulme, managing:
//! - Application state across all tabs
//! - Event handling (keyboard input and task completions)
//! - Spawning journal and chat requests

use crate::api::{ApiError, MindfulApi};
use crate::config::Config;
use crate::event::{AppEvent, TaskResult};
use crate::types::{ChatMessage, EntriesView, JournalEntry, SavedEntry, Tab};
use crate::ui::Theme;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Bot line shown when the service answers with an error
pub const BOT_TROUBLE_MESSAGE: &str = "Oops! The bot is having trouble connecting to the server.";
/// Bot line shown when the service cannot be reached
pub const BOT_OFFLINE_MESSAGE: &str = "Connection failed. ZenBot is taking a quick break.";

const EMPTY_ENTRY_NOTICE: &str = "Please write something before saving!";

/// Journal preview lengths offered in the Settings tab
const PREVIEW_LENGTHS: [usize; 4] = [100, 300, 500, 1000];

/// Number of adjustable rows in the Settings tab
pub const SETTINGS_COUNT: usize = 2;

/// Main application state
pub struct App {
    // Core state
    pub should_quit: bool,
    pub active_tab: Tab,
    pub config: Config,
    pub theme: Theme,
    pub server_url: String,
    api: Arc<dyn MindfulApi>,
    events: mpsc::Sender<AppEvent>,

    // Typing into the active tab's input box
    pub input_mode: bool,

    // Journal tab state
    pub entries: EntriesView,
    pub entries_scroll: usize,
    pub journal_input: String,
    pub saves_in_flight: usize,

    // Chat tab state
    pub transcript: Vec<ChatMessage>,
    pub chat_input: String,
    pub replies_pending: usize,

    // Settings tab state
    pub settings_selected: usize,

    // Popup state
    pub popup: PopupState,

    // Flash message (temporary feedback)
    pub flash_message: Option<(String, bool, Instant)>, // (message, is_error, timestamp)
}

/// Popup overlay state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupState {
    None,
    Error {
        title: String,
        message: String,
    },
}

impl App {
    /// Create a new App instance
    pub fn new(
        config: Config,
        server_url: String,
        api: Arc<dyn MindfulApi>,
        events: mpsc::Sender<AppEvent>,
    ) -> Self {
        let theme = Theme::from_name(config.theme);

        Self {
            should_quit: false,
            active_tab: Tab::Journal,
            config,
            theme,
            server_url,
            api,
            events,

            input_mode: false,

            entries: EntriesView::Loading,
            entries_scroll: 0,
            journal_input: String::new(),
            saves_in_flight: 0,

            transcript: Vec::new(),
            chat_input: String::new(),
            replies_pending: 0,

            settings_selected: 0,

            popup: PopupState::None,
            flash_message: None,
        }
    }

    /// Dispatch one event from the main loop
    pub fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Key(key) => self.handle_key(key)?,
            AppEvent::Tick => self.expire_flash(),
            AppEvent::Completed(result) => self.handle_completion(result),
        }
        Ok(())
    }

    // === TAB CONTROLLER ===

    /// Show `tab` as the only visible panel; the journal reloads on activation
    pub fn activate(&mut self, tab: Tab) {
        self.active_tab = tab;
        self.input_mode = false;

        if tab == Tab::Journal {
            self.list();
        }
    }

    // === JOURNAL CLIENT ===

    /// Reload the entry list from the service
    pub fn list(&mut self) {
        self.entries = EntriesView::Loading;
        self.entries_scroll = 0;

        let api = Arc::clone(&self.api);
        self.spawn_task(async move { TaskResult::EntriesLoaded(api.list_entries().await) });
    }

    /// Submit a new entry; blank text never reaches the network
    pub fn save(&mut self, text: &str) {
        let content = text.trim();
        if content.is_empty() {
            self.show_flash(EMPTY_ENTRY_NOTICE, true);
            return;
        }

        self.saves_in_flight += 1;
        let content = content.to_string();
        let api = Arc::clone(&self.api);
        self.spawn_task(async move { TaskResult::EntrySaved(api.save_entry(&content).await) });
    }

    // === CHAT CLIENT ===

    /// Append the user's message right away and ask the bot for a reply
    pub fn send(&mut self, text: &str) {
        let message = text.trim();
        if message.is_empty() {
            return;
        }

        self.transcript.push(ChatMessage::user(message));
        self.chat_input.clear();
        self.replies_pending += 1;

        let message = message.to_string();
        let api = Arc::clone(&self.api);
        self.spawn_task(async move { TaskResult::ChatReplied(api.chat(&message).await) });
    }

    /// Run a request on the runtime; its result comes back as an event
    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = task.await;
            if tx.send(AppEvent::Completed(result)).await.is_err() {
                tracing::debug!("event loop closed before task completed");
            }
        });
    }

    // === COMPLETIONS ===

    fn handle_completion(&mut self, result: TaskResult) {
        match result {
            TaskResult::EntriesLoaded(result) => self.on_entries_loaded(result),
            TaskResult::EntrySaved(result) => self.on_entry_saved(result),
            TaskResult::ChatReplied(result) => self.on_chat_replied(result),
        }
    }

    fn on_entries_loaded(&mut self, result: Result<Vec<JournalEntry>, ApiError>) {
        match result {
            Ok(entries) => {
                tracing::debug!(count = entries.len(), "journal entries loaded");
                self.entries = EntriesView::from_entries(entries);
                self.entries_scroll = 0;
            }
            Err(e) => {
                tracing::error!(error = %e, url = %self.server_url, "error loading entries");
                self.entries = EntriesView::Failed;
            }
        }
    }

    fn on_entry_saved(&mut self, result: Result<SavedEntry, ApiError>) {
        self.saves_in_flight = self.saves_in_flight.saturating_sub(1);

        match result {
            Ok(saved) => {
                tracing::info!(
                    date = %saved.date,
                    server_message = saved.message.as_deref().unwrap_or_default(),
                    "journal entry saved"
                );
                self.show_flash(&format!("Entry saved on {}!", saved.day()), false);
                self.journal_input.clear();
                // Typing may have moved on to another tab meanwhile
                if self.active_tab == Tab::Journal {
                    self.input_mode = false;
                }
                self.list();
            }
            Err(e) => {
                tracing::error!(error = %e, "error saving entry");
                let message = match &e {
                    ApiError::Unreachable(_) => format!(
                        "Could not connect to the backend server (is it running at {}?)",
                        self.server_url
                    ),
                    other => format!("Error saving entry: {}", other),
                };
                self.show_error("Save Failed", &message);
            }
        }
    }

    fn on_chat_replied(&mut self, result: Result<String, ApiError>) {
        self.replies_pending = self.replies_pending.saturating_sub(1);

        let reply = match result {
            Ok(reply) => reply,
            Err(e) if e.is_transport() => {
                tracing::error!(error = %e, "chatbot unreachable");
                BOT_OFFLINE_MESSAGE.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "chatbot returned an error");
                BOT_TROUBLE_MESSAGE.to_string()
            }
        };
        self.transcript.push(ChatMessage::bot(reply));
    }

    // === KEY HANDLING ===

    /// Handle a key event
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        if self.popup != PopupState::None {
            return self.handle_popup_key(key);
        }

        if self.input_mode {
            return self.handle_input_key(key);
        }

        // Global keys (work in all tabs)
        let target = match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('1') => Some(Tab::Journal),
            KeyCode::Char('2') => Some(Tab::Chat),
            KeyCode::Char('3') => Some(Tab::Settings),
            KeyCode::Tab => Some(self.active_tab.next()),
            KeyCode::BackTab => Some(self.active_tab.previous()),
            _ => None,
        };
        if let Some(tab) = target {
            self.activate(tab);
            return Ok(());
        }

        // Tab-specific handling
        match self.active_tab {
            Tab::Journal => self.handle_journal_key(key),
            Tab::Chat => self.handle_chat_key(key),
            Tab::Settings => self.handle_settings_key(key),
        }
    }

    /// Handle keys in Journal tab
    fn handle_journal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('i') | KeyCode::Enter => self.input_mode = true,
            KeyCode::Char('s') => {
                let text = self.journal_input.clone();
                self.save(&text);
            }
            KeyCode::Char('r') => self.list(),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.entries_scroll < self.entries.len().saturating_sub(1) {
                    self.entries_scroll += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.entries_scroll = self.entries_scroll.saturating_sub(1);
            }
            KeyCode::Char('g') => self.entries_scroll = 0,
            KeyCode::Char('G') => self.entries_scroll = self.entries.len().saturating_sub(1),
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in Chat tab
    fn handle_chat_key(&mut self, key: KeyEvent) -> Result<()> {
        if matches!(key.code, KeyCode::Char('i') | KeyCode::Enter) {
            self.input_mode = true;
        }
        Ok(())
    }

    /// Handle keys while typing into the journal editor or chat box
    fn handle_input_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match (self.active_tab, key.code) {
            (_, KeyCode::Esc) => self.input_mode = false,
            (Tab::Journal, KeyCode::Char('s')) if ctrl => {
                let text = self.journal_input.clone();
                self.save(&text);
            }
            (Tab::Journal, KeyCode::Enter) => self.journal_input.push('\n'),
            (Tab::Journal, KeyCode::Backspace) => {
                self.journal_input.pop();
            }
            (Tab::Journal, KeyCode::Char(c)) if !ctrl => self.journal_input.push(c),
            (Tab::Chat, KeyCode::Enter) => {
                let text = self.chat_input.clone();
                self.send(&text);
            }
            (Tab::Chat, KeyCode::Backspace) => {
                self.chat_input.pop();
            }
            (Tab::Chat, KeyCode::Char(c)) if !ctrl => self.chat_input.push(c),
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in Settings tab
    fn handle_settings_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.settings_selected < SETTINGS_COUNT - 1 {
                    self.settings_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.settings_selected = self.settings_selected.saturating_sub(1);
            }
            KeyCode::Enter => {
                match self.settings_selected {
                    0 => {
                        self.config.theme = self.config.theme.next();
                        self.theme = Theme::from_name(self.config.theme);
                    }
                    1 => {
                        self.config.journal.preview_length =
                            next_preview_length(self.config.journal.preview_length);
                    }
                    _ => {}
                }
                // Save config
                if let Err(e) = self.config.save() {
                    tracing::error!(error = %e, "failed to save config");
                    self.show_error("Save Failed", &e.to_string());
                } else {
                    self.show_flash("Settings saved", false);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in error popup
    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        if matches!(key.code, KeyCode::Char('o') | KeyCode::Enter | KeyCode::Esc) {
            self.popup = PopupState::None;
        }
        Ok(())
    }

    // === HELPER METHODS ===

    /// Drop the flash message once it has been visible for a few seconds
    fn expire_flash(&mut self) {
        if let Some((_, _, instant)) = &self.flash_message {
            if instant.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    /// Show an error popup
    fn show_error(&mut self, title: &str, message: &str) {
        self.popup = PopupState::Error {
            title: title.into(),
            message: message.into(),
        };
    }

    /// Show a flash message
    fn show_flash(&mut self, message: &str, is_error: bool) {
        self.flash_message = Some((message.into(), is_error, Instant::now()));
    }
}

fn next_preview_length(current: usize) -> usize {
    PREVIEW_LENGTHS
        .iter()
        .copied()
        .find(|len| *len > current)
        .unwrap_or(PREVIEW_LENGTHS[0])
}
