use crate::classifier::Letter;
use crate::error::{GiftError, Result};
use crate::landmarks::LandmarkFrame;
use crate::session::{SessionInput, SessionSnapshot};
use crate::surprise::SurpriseId;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Cloneable sender side of a running session
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionInput>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl SessionHandle {
    pub(super) fn new(
        sender: mpsc::Sender<SessionInput>,
        snapshot: Arc<RwLock<SessionSnapshot>>,
    ) -> Self {
        Self { sender, snapshot }
    }

    /// Queue an input; waits while the queue is full
    pub async fn send(&self, input: SessionInput) -> Result<()> {
        self.sender
            .send(input)
            .await
            .map_err(|_| GiftError::system("Session task is not running"))
    }

    /// Queue an input from a thread outside the async runtime
    pub fn blocking_send(&self, input: SessionInput) -> Result<()> {
        self.sender
            .blocking_send(input)
            .map_err(|_| GiftError::system("Session task is not running"))
    }

    pub async fn landmarks(&self, frame: LandmarkFrame) -> Result<()> {
        self.send(SessionInput::Landmarks(frame)).await
    }

    pub async fn intro_text_complete(&self) -> Result<()> {
        self.send(SessionInput::IntroTextComplete).await
    }

    pub async fn surprise_closed(&self, surprise: SurpriseId) -> Result<()> {
        self.send(SessionInput::SurpriseClosed(surprise)).await
    }

    pub async fn letter_card_closed(&self, letter: Letter) -> Result<()> {
        self.send(SessionInput::LetterCardClosed(letter)).await
    }

    pub async fn set_modal_open(&self, open: bool) -> Result<()> {
        self.send(SessionInput::ModalOpen(open)).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(SessionInput::Shutdown).await
    }

    /// State as of the last processed input
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
