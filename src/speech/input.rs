//! Speech input: listening sessions yielding at most one transcript each.

use bevy::prelude::*;

/// A speech recognizer.
pub trait SpeechInput {
    fn start_listening(&mut self);
    fn stop_listening(&mut self);
    fn is_listening(&self) -> bool;
    /// Transcript of the current session, returned at most once.
    fn take_transcript(&mut self) -> Option<String>;
}

/// Recognizer stand-in: the user types the utterance into a prompt box.
#[derive(Resource, Debug, Default)]
pub struct TypedSpeechInput {
    listening: bool,
    /// Prompt box contents
    pub draft: String,
    transcript: Option<String>,
    delivered: bool,
}

impl TypedSpeechInput {
    /// Finish the utterance. Ignored outside a session or after a transcript.
    pub fn submit(&mut self) {
        if !self.listening || self.delivered || self.transcript.is_some() {
            return;
        }
        let text = self.draft.trim();
        if text.is_empty() {
            return;
        }
        self.transcript = Some(text.to_string());
        self.draft.clear();
    }
}

impl SpeechInput for TypedSpeechInput {
    fn start_listening(&mut self) {
        self.listening = true;
        self.delivered = false;
        self.transcript = None;
        self.draft.clear();
    }

    fn stop_listening(&mut self) {
        self.listening = false;
        self.transcript = None;
    }

    fn is_listening(&self) -> bool {
        self.listening
    }

    fn take_transcript(&mut self) -> Option<String> {
        let transcript = self.transcript.take()?;
        self.delivered = true;
        self.listening = false;
        Some(transcript)
    }
}
