//! Event system merging keyboard input, ticks and task completions
//!
//! Every source feeds a single mpsc channel consumed by the main loop.

use crate::api::ApiError;
use crate::types::{JournalEntry, SavedEntry};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Capacity of the shared event channel
pub const EVENT_CHANNEL_SIZE: usize = 256;

/// How long one blocking terminal poll may wait
const KEY_POLL_TIMEOUT: Duration = Duration::from_millis(50);
/// Redraw cadence for the spinner and flash expiry
const TICK_RATE: Duration = Duration::from_millis(100);

/// Unified event type for the main loop
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input from crossterm
    Key(KeyEvent),
    /// Periodic redraw tick
    Tick,
    /// A network task finished
    Completed(TaskResult),
}

/// Outcome of a spawned network task
#[derive(Debug)]
pub enum TaskResult {
    EntriesLoaded(Result<Vec<JournalEntry>, ApiError>),
    EntrySaved(Result<SavedEntry, ApiError>),
    ChatReplied(Result<String, ApiError>),
}

/// Start the keyboard reader and the ticker; both stop once `tx` is closed
pub fn spawn_event_tasks(tx: mpsc::Sender<AppEvent>) {
    spawn_keyboard_task(tx.clone());
    spawn_tick_task(tx);
}

/// Wait briefly for a terminal event and keep key presses only
fn poll_key(timeout: Duration) -> Option<KeyEvent> {
    if !event::poll(timeout).unwrap_or(false) {
        return None;
    }
    match event::read() {
        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(key),
        _ => None,
    }
}

fn spawn_keyboard_task(tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        while !tx.is_closed() {
            let key = match tokio::task::spawn_blocking(|| poll_key(KEY_POLL_TIMEOUT)).await {
                Ok(key) => key,
                Err(e) => {
                    tracing::error!(error = %e, "terminal reader stopped");
                    return;
                }
            };

            if let Some(key) = key {
                if tx.send(AppEvent::Key(key)).await.is_err() {
                    return;
                }
            }
        }
    });
}

fn spawn_tick_task(tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(TICK_RATE);
        // A stalled loop gets one catch-up tick, not a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if tx.send(AppEvent::Tick).await.is_err() {
                return;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_event_debug() {
        let event = AppEvent::Tick;
        assert_eq!(format!("{:?}", event), "Tick");
    }

    #[tokio::test]
    async fn test_tick_task_delivers() {
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        spawn_tick_task(tx);

        let event = rx.recv().await;
        assert!(matches!(event, Some(AppEvent::Tick)));
    }
}
