use crate::app::SessionHandle;
use crate::error::Result;
use crate::session::SessionInput;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Map a key to the session input it stands for
pub fn input_for_key(code: KeyCode, modal_open: &mut bool) -> Option<SessionInput> {
    match code {
        KeyCode::Char(' ') => Some(SessionInput::ClosePresentation),
        KeyCode::Char('i') => Some(SessionInput::IntroTextComplete),
        KeyCode::Char('m') => {
            *modal_open = !*modal_open;
            Some(SessionInput::ModalOpen(*modal_open))
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(SessionInput::Shutdown),
        _ => None,
    }
}

/// Keyboard stand-in for the presentation layer's close and intro signals
pub struct KeyboardInputHandler {
    handle: SessionHandle,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    /// Create a new keyboard input handler
    pub fn new(handle: SessionHandle) -> Self {
        Self {
            handle,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard controls - SPACE closes, i ends intro, m toggles modal, q quits");

        let handle = self.handle.clone();
        let cancellation_token = self.cancellation_token.clone();

        // Spawn a blocking task to handle keyboard input
        task::spawn_blocking(move || {
            // Enable raw mode to capture individual key presses
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");
            let mut modal_open = false;

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        // Only handle key press events (not release)
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }
                        let Some(input) = input_for_key(key_event.code, &mut modal_open) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        let quit = input == SessionInput::Shutdown;
                        info!("Key {:?} -> {:?}", key_event.code, input);
                        if let Err(e) = handle.blocking_send(input) {
                            warn!("Failed to send keyboard input: {}", e);
                            break;
                        }
                        if quit {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            // Disable raw mode when exiting
            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Ensure raw mode is disabled even if the task didn't clean up properly
        let _ = disable_raw_mode();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let mut modal_open = false;
        assert_eq!(
            input_for_key(KeyCode::Char(' '), &mut modal_open),
            Some(SessionInput::ClosePresentation)
        );
        assert_eq!(
            input_for_key(KeyCode::Char('i'), &mut modal_open),
            Some(SessionInput::IntroTextComplete)
        );
        assert_eq!(
            input_for_key(KeyCode::Esc, &mut modal_open),
            Some(SessionInput::Shutdown)
        );
        assert_eq!(input_for_key(KeyCode::Char('x'), &mut modal_open), None);
    }

    #[test]
    fn test_modal_key_toggles() {
        let mut modal_open = false;
        assert_eq!(
            input_for_key(KeyCode::Char('m'), &mut modal_open),
            Some(SessionInput::ModalOpen(true))
        );
        assert_eq!(
            input_for_key(KeyCode::Char('m'), &mut modal_open),
            Some(SessionInput::ModalOpen(false))
        );
    }
}
