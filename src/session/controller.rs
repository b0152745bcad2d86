use super::rotation::SceneRotation;
use super::types::{Presentation, SessionInput, SessionMode, SessionSnapshot, Trigger};
use crate::classifier::{classify_with, Classification, Letter, Thresholds};
use crate::clock::Clock;
use crate::collection::{Artifact, CollectionTracker};
use crate::config::{FinaleVariant, GiftConfig};
use crate::error::{GiftError, Result};
use crate::events::SessionEvent;
use crate::hold::{HoldStatus, HoldTarget, HoldTimer};
use crate::landmarks::{LandmarkFrame, WRIST};
use crate::surprise::{SurpriseDispatch, SurpriseId, SurpriseSequencer};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Hold durations per target kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HoldDurations {
    ok_ms: u64,
    collect_ms: u64,
    thumbs_up_ms: u64,
}

impl HoldDurations {
    fn for_target(&self, target: HoldTarget) -> u64 {
        match target {
            HoldTarget::Ok => self.ok_ms,
            HoldTarget::Letter(_) => self.collect_ms,
            HoldTarget::ThumbsUp => self.thumbs_up_ms,
        }
    }
}

/// Owns all state of one session and turns inputs into [`SessionEvent`]s.
///
/// Synchronous and single-owner. Time comes from the injected [`Clock`];
/// nothing here sleeps.
pub struct SessionController {
    session_id: Uuid,
    clock: Arc<dyn Clock>,
    thresholds: Thresholds,
    durations: HoldDurations,
    cooldown_ms: u64,
    finale: FinaleVariant,

    mode: SessionMode,
    hold: HoldTimer,
    collection: CollectionTracker,
    sequencer: SurpriseSequencer,
    rotation: SceneRotation,
    presentation: Option<Presentation>,
    last_close_ms: Option<u64>,
    intro_text_complete: bool,
    modal_open: bool,
}

impl SessionController {
    /// Create a controller for a fresh session
    pub fn new(config: &GiftConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::with_session_id(config, clock, Uuid::new_v4())
    }

    pub fn with_session_id(
        config: &GiftConfig,
        clock: Arc<dyn Clock>,
        session_id: Uuid,
    ) -> Result<Self> {
        let sequencer = SurpriseSequencer::new(config.surprises.queue.clone())?;

        info!("Session {} started", session_id);
        Ok(Self {
            session_id,
            clock,
            thresholds: Thresholds::from(&config.gesture),
            durations: HoldDurations {
                ok_ms: config.gesture.ok_hold_ms,
                collect_ms: config.gesture.collect_hold_ms,
                thumbs_up_ms: config.gesture.thumbs_up_hold_ms,
            },
            cooldown_ms: config.session.cooldown_ms,
            finale: config.session.finale,
            mode: SessionMode::Intro,
            hold: HoldTimer::new(),
            collection: CollectionTracker::new(),
            sequencer,
            rotation: SceneRotation::from(&config.session),
            presentation: None,
            last_close_ms: None,
            intro_text_complete: false,
            modal_open: false,
        })
    }

    /// Dispatch one queued input
    pub fn apply(&mut self, input: SessionInput) -> Result<Vec<SessionEvent>> {
        match input {
            SessionInput::Landmarks(frame) => Ok(self.on_landmarks(&frame)),
            SessionInput::IntroTextComplete => {
                self.on_intro_text_complete();
                Ok(Vec::new())
            }
            SessionInput::SurpriseClosed(surprise) => self.on_surprise_closed(surprise),
            SessionInput::LetterCardClosed(letter) => self.on_letter_card_closed(letter),
            SessionInput::ClosePresentation => self.close_active_presentation(),
            SessionInput::ModalOpen(open) => {
                self.set_modal_open(open);
                Ok(Vec::new())
            }
            SessionInput::Shutdown => Ok(Vec::new()),
        }
    }

    /// Process one camera frame's landmarks
    pub fn on_landmarks(&mut self, frame: &LandmarkFrame) -> Vec<SessionEvent> {
        let now_ms = self.clock.now_ms();
        let mut events = Vec::new();
        let hand = frame.primary_hand();
        let paused = self.is_paused();

        let wrist_x = hand.and_then(|landmarks| landmarks.get(WRIST)).map(|l| l.x);
        if let Some(target) = self.rotation.track(wrist_x, paused) {
            events.push(SessionEvent::RotationChanged { target });
        }

        if paused {
            self.cancel_hold(&mut events);
            return events;
        }

        let classification = classify_with(hand, &self.thresholds);
        let candidate = self.candidate(&classification, now_ms);
        let previous = self.hold.target();
        let duration = candidate
            .map(|target| self.durations.for_target(target))
            .unwrap_or_default();

        match self.hold.update(candidate, now_ms, duration) {
            HoldStatus::Idle => {
                if let Some(target) = previous {
                    events.push(SessionEvent::HoldCancelled { target });
                }
            }
            HoldStatus::Holding { target, progress } => {
                if let Some(previous) = previous.filter(|&p| p != target) {
                    events.push(SessionEvent::HoldCancelled { target: previous });
                }
                events.push(SessionEvent::HoldProgress { target, progress });
            }
            HoldStatus::Confirmed { target } => {
                if let Err(e) = self.on_confirmed(target, now_ms, &mut events) {
                    error!("Dropping confirmation of {}: {}", target, e);
                }
            }
        }

        events
    }

    /// The intro text finished animating; the OK gate becomes live
    pub fn on_intro_text_complete(&mut self) {
        if self.mode != SessionMode::Intro {
            warn!("Intro text completion ignored in mode {}", self.mode);
            return;
        }
        if !self.intro_text_complete {
            info!("Intro text complete, waiting for OK");
            self.intro_text_complete = true;
        }
    }

    /// The presentation layer finished running a surprise
    pub fn on_surprise_closed(&mut self, surprise: SurpriseId) -> Result<Vec<SessionEvent>> {
        match self.presentation {
            Some(Presentation::Surprise { surprise: active, .. }) if active == surprise => {
                self.close_presentation()
            }
            _ => Err(self.unexpected_close(format!("surprise {}", surprise))),
        }
    }

    /// The presentation layer dismissed a letter card
    pub fn on_letter_card_closed(&mut self, letter: Letter) -> Result<Vec<SessionEvent>> {
        match self.presentation {
            Some(Presentation::LetterCard { letter: active }) if active == letter => {
                self.close_presentation()
            }
            _ => Err(self.unexpected_close(format!("letter card for '{}'", letter))),
        }
    }

    /// Close whatever is being presented, as a Space press would
    pub fn close_active_presentation(&mut self) -> Result<Vec<SessionEvent>> {
        match self.presentation {
            Some(Presentation::Surprise { surprise, .. }) => self.on_surprise_closed(surprise),
            Some(Presentation::LetterCard { letter }) => self.on_letter_card_closed(letter),
            None => Err(self.unexpected_close("active presentation".to_string())),
        }
    }

    /// External modal flag; gesture processing is paused while set
    pub fn set_modal_open(&mut self, open: bool) {
        if self.modal_open != open {
            debug!("Modal {}", if open { "opened" } else { "closed" });
            self.modal_open = open;
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn presentation(&self) -> Option<Presentation> {
        self.presentation
    }

    pub fn collection(&self) -> &CollectionTracker {
        &self.collection
    }

    pub fn sequencer(&self) -> &SurpriseSequencer {
        &self.sequencer
    }

    pub fn rotation(&self) -> &SceneRotation {
        &self.rotation
    }

    pub fn intro_text_complete(&self) -> bool {
        self.intro_text_complete
    }

    /// Gameplay pose processing is skipped while this is true
    pub fn is_paused(&self) -> bool {
        self.presentation.is_some() || self.modal_open || self.mode.is_terminal()
    }

    /// Whether a recent close still suppresses holds
    pub fn in_cooldown(&self, now_ms: u64) -> bool {
        self.last_close_ms
            .is_some_and(|closed| now_ms.saturating_sub(closed) < self.cooldown_ms)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            mode: self.mode,
            collected: self.collection.collected_letters(),
            surprise_cursor: self.sequencer.cursor(),
            paused: self.is_paused(),
            presentation: self.presentation,
            rotation_target: self.rotation.target(),
        }
    }

    /// Pose the current mode is listening for in this frame
    fn candidate(&self, classification: &Classification, now_ms: u64) -> Option<HoldTarget> {
        match self.mode {
            SessionMode::Intro if self.intro_text_complete && classification.is_ok() => {
                Some(HoldTarget::Ok)
            }
            SessionMode::Instructions if classification.is_ok() => Some(HoldTarget::Ok),
            SessionMode::Collecting if !self.in_cooldown(now_ms) => classification
                .first_letter_where(|letter| self.collection.is_collected(letter))
                .map(HoldTarget::Letter),
            SessionMode::FinaleReady if !self.in_cooldown(now_ms) && classification.thumbs_up => {
                Some(HoldTarget::ThumbsUp)
            }
            _ => None,
        }
    }

    fn on_confirmed(
        &mut self,
        target: HoldTarget,
        now_ms: u64,
        events: &mut Vec<SessionEvent>,
    ) -> Result<()> {
        match target {
            HoldTarget::Ok => {
                let to = self.mode.next(Trigger::OkConfirmed, self.finale)?;
                info!("OK confirmed in mode {}", self.mode);
                events.push(SessionEvent::ControlConfirmed { target });
                self.enter(to, events);
            }
            HoldTarget::Letter(letter) => self.collect(letter, now_ms, events)?,
            HoldTarget::ThumbsUp => {
                let to = self.mode.next(Trigger::ThumbsUpConfirmed, self.finale)?;
                info!("Thumbs-up confirmed, revealing finale");
                events.push(SessionEvent::ControlConfirmed { target });
                self.enter(to, events);
                events.push(SessionEvent::FinaleRevealed {
                    artifacts: self.collection.artifacts(),
                });
            }
        }
        Ok(())
    }

    fn collect(&mut self, letter: Letter, now_ms: u64, events: &mut Vec<SessionEvent>) -> Result<()> {
        let to = self.mode.next(Trigger::LetterCollected, self.finale)?;
        let artifact = Artifact::new(self.session_id, letter, now_ms);
        let outcome = self.collection.record_collected(letter, artifact.clone())?;

        info!(
            "Letter '{}' collected ({}/{}), capture {}",
            letter,
            outcome.completion_count,
            Letter::SEQUENCE.len(),
            artifact.capture_id
        );
        events.push(SessionEvent::GestureConfirmed { letter, artifact });
        if outcome.set_completed {
            events.push(SessionEvent::SetComplete {
                artifacts: self.collection.artifacts(),
            });
        }

        let presentation = match self.sequencer.on_newly_collected(letter) {
            SurpriseDispatch::Blocking(surprise) => Presentation::Surprise { surprise, letter },
            SurpriseDispatch::Fallback | SurpriseDispatch::Exhausted => {
                Presentation::LetterCard { letter }
            }
        };
        self.presentation = Some(presentation);
        self.enter(to, events);

        events.push(match presentation {
            Presentation::Surprise { surprise, letter } => {
                SessionEvent::SurpriseRequested { surprise, letter }
            }
            Presentation::LetterCard { letter } => SessionEvent::LetterCardRequested { letter },
        });
        Ok(())
    }

    fn close_presentation(&mut self) -> Result<Vec<SessionEvent>> {
        let trigger = Trigger::PresentationClosed {
            set_complete: self.collection.is_complete(),
        };
        let to = self.mode.next(trigger, self.finale)?;
        let now_ms = self.clock.now_ms();

        if let Some(presentation) = self.presentation.take() {
            info!("Closed {}", presentation);
        }
        self.last_close_ms = Some(now_ms);
        self.hold.reset();

        let mut events = Vec::new();
        self.enter(to, &mut events);
        Ok(events)
    }

    fn enter(&mut self, to: SessionMode, events: &mut Vec<SessionEvent>) {
        let from = self.mode;
        self.mode = to;
        info!("Session mode {} -> {}", from, to);
        events.push(SessionEvent::ModeChanged { from, to });
    }

    fn cancel_hold(&mut self, events: &mut Vec<SessionEvent>) {
        if let Some(target) = self.hold.reset() {
            debug!("Hold of {} cancelled by pause", target);
            events.push(SessionEvent::HoldCancelled { target });
        }
    }

    fn unexpected_close(&self, closed: String) -> GiftError {
        let active = match self.presentation {
            Some(presentation) => format!("presenting {}", presentation),
            None => "nothing is presented".to_string(),
        };
        warn!("Rejected close of {} while {}", closed, active);
        GiftError::UnexpectedClose { closed, active }
    }
}
