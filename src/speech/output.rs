//! Speech output: one utterance at a time, shared by read-aloud and the assistant.

use std::time::Duration;

use bevy::prelude::*;
use thiserror::Error;

use crate::constants::{SPEECH_MIN_SECONDS, SPEECH_WORDS_PER_MINUTE};

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Nothing to speak")]
    Empty,
    #[error("Speech output unavailable: {0}")]
    Unavailable(String),
}

/// A text-to-speech backend.
///
/// `speak` cancels any utterance in progress. Completion is reported by
/// `tick` returning true exactly once per utterance.
pub trait SpeechOutput: Send + Sync {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError>;
    fn stop(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn tick(&mut self, delta: Duration) -> bool;
    /// Text currently being spoken, for display.
    fn caption(&self) -> Option<&str>;
}

/// Estimated time to read `text` aloud.
pub fn reading_time(text: &str) -> Duration {
    let words = text.split_whitespace().count() as f32;
    let seconds = (words / SPEECH_WORDS_PER_MINUTE * 60.0).max(SPEECH_MIN_SECONDS);
    Duration::from_secs_f32(seconds)
}

struct Utterance {
    text: String,
    remaining: Duration,
    paused: bool,
}

/// Voice that shows the text as a caption for its estimated reading time.
#[derive(Default)]
pub struct CaptionVoice {
    current: Option<Utterance>,
}

impl SpeechOutput for CaptionVoice {
    fn speak(&mut self, text: &str) -> Result<(), SpeechError> {
        self.current = None;
        if text.trim().is_empty() {
            return Err(SpeechError::Empty);
        }
        self.current = Some(Utterance {
            text: text.to_string(),
            remaining: reading_time(text),
            paused: false,
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.current = None;
    }

    fn pause(&mut self) {
        if let Some(utterance) = self.current.as_mut() {
            utterance.paused = true;
        }
    }

    fn resume(&mut self) {
        if let Some(utterance) = self.current.as_mut() {
            utterance.paused = false;
        }
    }

    fn tick(&mut self, delta: Duration) -> bool {
        let Some(utterance) = self.current.as_mut() else {
            return false;
        };
        if utterance.paused {
            return false;
        }
        utterance.remaining = utterance.remaining.saturating_sub(delta);
        if utterance.remaining.is_zero() {
            self.current = None;
            return true;
        }
        false
    }

    fn caption(&self) -> Option<&str> {
        self.current.as_ref().map(|u| u.text.as_str())
    }
}

/// Who started the current utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOwner {
    ReadAloud,
    Assistant,
}

/// Sent when an utterance ends on its own (not when it is stopped).
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechFinished {
    pub owner: SpeechOwner,
}

/// The single speech output of the application and its current owner.
#[derive(Resource)]
pub struct SpeechChannel {
    voice: Box<dyn SpeechOutput>,
    owner: Option<SpeechOwner>,
    paused: bool,
}

impl Default for SpeechChannel {
    fn default() -> Self {
        Self::new(Box::new(CaptionVoice::default()))
    }
}

impl SpeechChannel {
    pub fn new(voice: Box<dyn SpeechOutput>) -> Self {
        Self {
            voice,
            owner: None,
            paused: false,
        }
    }

    pub fn owner(&self) -> Option<SpeechOwner> {
        self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn caption(&self) -> Option<&str> {
        self.voice.caption()
    }

    /// Start an utterance, cancelling whatever was playing.
    pub fn speak(&mut self, owner: SpeechOwner, text: &str) -> Result<(), SpeechError> {
        if let Some(previous) = self.owner
            && previous != owner
        {
            debug!("{:?} speech interrupted by {:?}", previous, owner);
        }
        self.owner = None;
        self.paused = false;
        self.voice.speak(text)?;
        self.owner = Some(owner);
        Ok(())
    }

    /// Stop the current utterance if `owner` started it.
    pub fn stop(&mut self, owner: SpeechOwner) {
        if self.owner == Some(owner) {
            self.voice.stop();
            self.owner = None;
            self.paused = false;
        }
    }

    pub fn pause(&mut self, owner: SpeechOwner) {
        if self.owner == Some(owner) && !self.paused {
            self.voice.pause();
            self.paused = true;
        }
    }

    pub fn resume(&mut self, owner: SpeechOwner) {
        if self.owner == Some(owner) && self.paused {
            self.voice.resume();
            self.paused = false;
        }
    }

    /// Advance playback; returns the owner of an utterance that just ended.
    pub fn tick(&mut self, delta: Duration) -> Option<SpeechOwner> {
        if self.owner.is_none() {
            return None;
        }
        if self.voice.tick(delta) {
            self.paused = false;
            return self.owner.take();
        }
        None
    }
}

pub fn tick_speech(
    time: Res<Time>,
    mut channel: ResMut<SpeechChannel>,
    mut finished: MessageWriter<SpeechFinished>,
) {
    if let Some(owner) = channel.tick(time.delta()) {
        finished.write(SpeechFinished { owner });
    }
}
