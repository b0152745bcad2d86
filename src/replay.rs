//! Recorded session inputs: JSON-lines parsing, deterministic replay on a
//! manual clock, real-time playback into a running session, and the scripted
//! demo session.

use crate::app::SessionHandle;
use crate::classifier::Letter;
use crate::clock::{Clock, ManualClock};
use crate::config::{FinaleVariant, GiftConfig};
use crate::error::{GiftError, Result};
use crate::events::SessionEvent;
use crate::fixtures::{letter_hand, open_hand, thumbs_up_hand};
use crate::landmarks::{Landmark, LandmarkFrame};
use crate::session::{SessionController, SessionInput};
use crate::surprise::SurpriseId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One line of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Milliseconds since the start of the recording
    pub t: u64,
    #[serde(flatten)]
    pub input: RecordedInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordedInput {
    Landmarks {
        #[serde(default)]
        hands: Vec<Vec<Landmark>>,
    },
    IntroComplete,
    SurpriseClosed {
        surprise: SurpriseId,
    },
    LetterCardClosed {
        letter: Letter,
    },
    Modal {
        open: bool,
    },
}

impl ReplayRecord {
    pub fn new(t: u64, input: RecordedInput) -> Self {
        Self { t, input }
    }

    pub fn to_input(&self) -> SessionInput {
        match &self.input {
            RecordedInput::Landmarks { hands } => SessionInput::Landmarks(LandmarkFrame {
                timestamp_ms: self.t,
                hands: hands.clone(),
            }),
            RecordedInput::IntroComplete => SessionInput::IntroTextComplete,
            RecordedInput::SurpriseClosed { surprise } => SessionInput::SurpriseClosed(*surprise),
            RecordedInput::LetterCardClosed { letter } => SessionInput::LetterCardClosed(*letter),
            RecordedInput::Modal { open } => SessionInput::ModalOpen(*open),
        }
    }
}

/// Parse a JSON-lines recording. Blank lines and `#` comments are skipped.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<ReplayRecord>> {
    let mut records: Vec<ReplayRecord> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let record: ReplayRecord = serde_json::from_str(trimmed)
            .map_err(|e| GiftError::replay(line_number, e.to_string()))?;

        if let Some(previous) = records.last() {
            if record.t < previous.t {
                return Err(GiftError::replay(
                    line_number,
                    format!(
                        "timestamp {} is earlier than the previous {}",
                        record.t, previous.t
                    ),
                ));
            }
        }
        records.push(record);
    }

    debug!("Parsed {} replay records", records.len());
    Ok(records)
}

/// Load a recording from disk
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<ReplayRecord>> {
    let path = path.as_ref();
    info!("Loading replay from {}", path.display());
    let file = File::open(path)?;
    parse_records(BufReader::new(file))
}

/// Write records as JSON lines
pub fn write_records<W: Write>(records: &[ReplayRecord], mut writer: W) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Feeds records to a controller on a manual clock, as fast as possible
pub struct Replayer {
    clock: ManualClock,
    controller: SessionController,
    auto_close_ms: Option<u64>,
    presented_at: Option<u64>,
    rejected: usize,
}

impl Replayer {
    /// `auto_close_ms` closes any presentation that long after it opened
    pub fn new(config: &GiftConfig, auto_close_ms: Option<u64>) -> Result<Self> {
        let clock = ManualClock::new(0);
        let controller = SessionController::new(config, Arc::new(clock.clone()))?;
        Ok(Self {
            clock,
            controller,
            auto_close_ms,
            presented_at: None,
            rejected: 0,
        })
    }

    /// Apply one record. Rejected inputs are logged and counted.
    pub fn apply(&mut self, record: &ReplayRecord) -> Vec<SessionEvent> {
        let mut events = self.auto_close_until(record.t);

        // Never let the clock run backwards past an auto-close
        self.clock.set(record.t.max(self.clock.now_ms()));
        match self.controller.apply(record.to_input()) {
            Ok(applied) => events.extend(applied),
            Err(e) => {
                warn!("Replay input at {}ms rejected: {}", record.t, e);
                self.rejected += 1;
            }
        }

        self.track_presentation();
        events
    }

    /// Apply every record in order
    pub fn run(&mut self, records: &[ReplayRecord]) -> Vec<SessionEvent> {
        records
            .iter()
            .flat_map(|record| self.apply(record))
            .collect()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn into_controller(self) -> SessionController {
        self.controller
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    fn auto_close_until(&mut self, t: u64) -> Vec<SessionEvent> {
        let (Some(delay), Some(opened)) = (self.auto_close_ms, self.presented_at) else {
            return Vec::new();
        };
        let due = opened.saturating_add(delay);
        if t < due {
            return Vec::new();
        }

        self.clock.set(due);
        self.presented_at = None;
        match self.controller.close_active_presentation() {
            Ok(events) => {
                debug!("Auto-closed presentation at {}ms", due);
                events
            }
            Err(e) => {
                warn!("Auto-close at {}ms rejected: {}", due, e);
                self.rejected += 1;
                Vec::new()
            }
        }
    }

    fn track_presentation(&mut self) {
        match (self.controller.presentation(), self.presented_at) {
            (Some(_), None) => self.presented_at = Some(self.clock.now_ms()),
            (None, Some(_)) => self.presented_at = None,
            _ => {}
        }
    }
}

/// Send records to a running session at their recorded pace.
///
/// With `auto_close_ms`, a presentation still open that long after it was
/// first seen is closed before the next record goes out.
pub async fn play_realtime(
    records: &[ReplayRecord],
    handle: &SessionHandle,
    auto_close_ms: Option<u64>,
    cancel: &CancellationToken,
) -> Result<usize> {
    let start = Instant::now();
    let mut presented_since: Option<Instant> = None;
    let mut sent = 0;

    for record in records {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Playback cancelled after {} records", sent);
                return Ok(sent);
            }
            _ = sleep_until(start + Duration::from_millis(record.t)) => {}
        }

        if let Some(delay) = auto_close_ms {
            let presenting = handle.snapshot().presentation.is_some();
            match presented_since {
                Some(since) if presenting && since.elapsed() >= Duration::from_millis(delay) => {
                    handle.send(SessionInput::ClosePresentation).await?;
                    presented_since = None;
                }
                None if presenting => presented_since = Some(Instant::now()),
                _ if !presenting => presented_since = None,
                _ => {}
            }
        }

        handle.send(record.to_input()).await?;
        sent += 1;
    }

    info!("Playback finished: {} records sent", sent);
    Ok(sent)
}

/// Builds a scripted recording frame by frame
struct ScriptBuilder {
    fps: u64,
    frame: u64,
    records: Vec<ReplayRecord>,
}

impl ScriptBuilder {
    fn new(fps: u32) -> Self {
        Self {
            fps: u64::from(fps.max(1)),
            frame: 0,
            records: Vec::new(),
        }
    }

    fn now(&self) -> u64 {
        self.frame * 1000 / self.fps
    }

    fn frames_for(&self, duration_ms: u64) -> u64 {
        (duration_ms * self.fps).div_ceil(1000)
    }

    fn hold(&mut self, hand: Option<Vec<Landmark>>, duration_ms: u64) {
        let hands: Vec<Vec<Landmark>> = hand.into_iter().collect();
        for _ in 0..self.frames_for(duration_ms) {
            self.push(RecordedInput::Landmarks {
                hands: hands.clone(),
            });
            self.frame += 1;
        }
    }

    /// Open hand sweeping sideways by `dx`
    fn wave(&mut self, dx: f32, duration_ms: u64) {
        let frames = self.frames_for(duration_ms).max(1);
        for step in 0..frames {
            let shift = dx * step as f32 / frames as f32;
            let hand = open_hand()
                .into_iter()
                .map(|l| Landmark::new(l.x + shift, l.y, l.z))
                .collect();
            self.push(RecordedInput::Landmarks { hands: vec![hand] });
            self.frame += 1;
        }
    }

    fn push(&mut self, input: RecordedInput) {
        let t = self.now();
        self.records.push(ReplayRecord::new(t, input));
    }
}

/// A complete scripted session: intro, both OK gates, all six letters with
/// their presentations left to `auto_close_ms`, and the finale.
pub fn demo_script(config: &GiftConfig, fps: u32, auto_close_ms: u64) -> Vec<ReplayRecord> {
    const MARGIN_MS: u64 = 200;
    let gesture = &config.gesture;
    let mut script = ScriptBuilder::new(fps);

    script.wave(0.15, 1000);
    script.push(RecordedInput::IntroComplete);
    script.hold(Some(letter_hand(Letter::O)), gesture.ok_hold_ms + MARGIN_MS);
    script.hold(None, 500);
    script.hold(Some(letter_hand(Letter::O)), gesture.ok_hold_ms + MARGIN_MS);
    script.hold(None, 500);

    let gap = auto_close_ms + config.session.cooldown_ms + 500;
    for letter in Letter::SEQUENCE {
        script.hold(
            Some(letter_hand(letter)),
            gesture.collect_hold_ms + MARGIN_MS,
        );
        script.hold(None, gap);
    }

    if config.session.finale == FinaleVariant::ThumbsUpGrid {
        script.hold(Some(thumbs_up_hand()), gesture.thumbs_up_hold_ms + MARGIN_MS);
        script.hold(None, 500);
    }

    debug!(
        "Demo script: {} records over {}ms",
        script.records.len(),
        script.now()
    );
    script.records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionMode;
    use std::io::Cursor;

    const SAMPLE: &str = r#"
# recorded on the kiosk
{"t": 0, "kind": "landmarks", "hands": []}
{"t": 16, "kind": "intro_complete"}
{"t": 33, "kind": "landmarks", "hands": [[{"x": 0.5, "y": 0.9}, {"x": 0.4, "y": 0.8, "z": -0.01}]]}

{"t": 40, "kind": "modal", "open": true}
{"t": 50, "kind": "surprise_closed", "surprise": "voice_clip"}
{"t": 60, "kind": "letter_card_closed", "letter": "U"}
"#;

    #[test]
    fn test_parse_all_record_kinds() {
        let records = parse_records(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(records[1].input, RecordedInput::IntroComplete);

        match &records[2].input {
            RecordedInput::Landmarks { hands } => {
                assert_eq!(hands[0].len(), 2);
                assert_eq!(hands[0][0].z, 0.0);
                assert_eq!(hands[0][1].z, -0.01);
            }
            other => panic!("Unexpected input: {:?}", other),
        }
        assert_eq!(
            records[4].to_input(),
            SessionInput::SurpriseClosed(SurpriseId::VoiceClip)
        );
        assert_eq!(
            records[5].to_input(),
            SessionInput::LetterCardClosed(Letter::U)
        );
        assert_eq!(records[3].to_input(), SessionInput::ModalOpen(true));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let input = "{\"t\": 0, \"kind\": \"intro_complete\"}\n\n{\"t\": 5, \"kind\": \"wave\"}\n";
        match parse_records(Cursor::new(input)) {
            Err(GiftError::Replay { line, .. }) => assert_eq!(line, 3),
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_timestamps_must_not_go_backwards() {
        let input = "{\"t\": 10, \"kind\": \"intro_complete\"}\n{\"t\": 5, \"kind\": \"intro_complete\"}\n";
        match parse_records(Cursor::new(input)) {
            Err(GiftError::Replay { line, details }) => {
                assert_eq!(line, 2);
                assert!(details.contains("earlier"));
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_demo_script_completes_a_session() {
        let config = GiftConfig::default();
        let records = demo_script(&config, 30, 2000);
        let mut replayer = Replayer::new(&config, Some(2000)).unwrap();
        let events = replayer.run(&records);

        let controller = replayer.controller();
        assert_eq!(controller.mode(), SessionMode::Finale);
        assert_eq!(controller.collection().completion_count(), 6);
        assert_eq!(replayer.rejected(), 0);

        let complete = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::SetComplete { .. }))
            .count();
        assert_eq!(complete, 1);
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::FinaleRevealed { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::RotationChanged { .. })));
    }

    #[test]
    fn test_demo_script_immediate_finale() {
        let mut config = GiftConfig::default();
        config.session.finale = FinaleVariant::Immediate;
        let records = demo_script(&config, 24, 1000);
        let mut replayer = Replayer::new(&config, Some(1000)).unwrap();
        replayer.run(&records);
        assert_eq!(replayer.controller().mode(), SessionMode::Finale);
    }

    #[test]
    fn test_without_auto_close_session_waits_on_presentation() {
        let config = GiftConfig::default();
        let records = demo_script(&config, 30, 2000);
        let mut replayer = Replayer::new(&config, None).unwrap();
        replayer.run(&records);

        let controller = replayer.into_controller();
        assert_eq!(controller.mode(), SessionMode::SurpriseActive);
        assert_eq!(controller.collection().collected_letters(), vec![Letter::I]);
    }

    #[test]
    fn test_recorded_close_drives_session() {
        let config = GiftConfig::default();
        let mut replayer = Replayer::new(&config, None).unwrap();
        let mut records = vec![ReplayRecord::new(0, RecordedInput::IntroComplete)];
        // Both OK gates, then an I held past the collection threshold
        let mut t = 0;
        for hand in [letter_hand(Letter::O), letter_hand(Letter::O)] {
            for _ in 0..=155 {
                t += 33;
                records.push(ReplayRecord::new(
                    t,
                    RecordedInput::Landmarks {
                        hands: vec![hand.clone()],
                    },
                ));
            }
            t += 33;
            records.push(ReplayRecord::new(t, RecordedInput::Landmarks { hands: vec![] }));
        }
        for _ in 0..=95 {
            t += 33;
            records.push(ReplayRecord::new(
                t,
                RecordedInput::Landmarks {
                    hands: vec![letter_hand(Letter::I)],
                },
            ));
        }
        records.push(ReplayRecord::new(
            t + 500,
            RecordedInput::SurpriseClosed {
                surprise: SurpriseId::VoiceClip,
            },
        ));
        records.push(ReplayRecord::new(
            t + 600,
            RecordedInput::SurpriseClosed {
                surprise: SurpriseId::PhotoSlideshow,
            },
        ));

        replayer.run(&records);
        assert_eq!(replayer.rejected(), 1);
        assert_eq!(replayer.controller().mode(), SessionMode::Collecting);
        assert!(replayer.controller().in_cooldown(t + 600 + 1000));
    }

    #[test]
    fn test_written_records_parse_back() {
        let config = GiftConfig::default();
        let records = demo_script(&config, 10, 500);
        let mut buffer = Vec::new();
        write_records(&records, &mut buffer).unwrap();
        let parsed = parse_records(Cursor::new(buffer)).unwrap();
        assert_eq!(parsed.len(), records.len());
        assert_eq!(parsed.last(), records.last());
    }
}
