//! Read the active document's text aloud.

use bevy::prelude::*;

use crate::documents::{ActiveDocument, Gallery};

use super::output::{SpeechChannel, SpeechOwner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadAloudState {
    #[default]
    Stopped,
    Speaking,
    Paused,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAloudCommand {
    Play,
    Pause,
    Stop,
}

#[derive(Resource, Debug, Default)]
pub struct ReadAloud {
    state: ReadAloudState,
}

impl ReadAloud {
    pub fn state(&self) -> ReadAloudState {
        self.state
    }

    /// Resume when paused, otherwise (re)start from the beginning.
    pub fn play(&mut self, channel: &mut SpeechChannel, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.state == ReadAloudState::Paused && channel.owner() == Some(SpeechOwner::ReadAloud) {
            channel.resume(SpeechOwner::ReadAloud);
            self.state = ReadAloudState::Speaking;
            return;
        }
        match channel.speak(SpeechOwner::ReadAloud, text) {
            Ok(()) => self.state = ReadAloudState::Speaking,
            Err(e) => {
                error!("Read aloud failed: {}", e);
                self.state = ReadAloudState::Stopped;
            }
        }
    }

    pub fn pause(&mut self, channel: &mut SpeechChannel) {
        if self.state == ReadAloudState::Speaking {
            channel.pause(SpeechOwner::ReadAloud);
            self.state = ReadAloudState::Paused;
        }
    }

    pub fn stop(&mut self, channel: &mut SpeechChannel) {
        channel.stop(SpeechOwner::ReadAloud);
        self.state = ReadAloudState::Stopped;
    }

    /// Drop back to stopped once the channel no longer plays for us.
    pub fn sync(&mut self, channel: &SpeechChannel) {
        if self.state != ReadAloudState::Stopped && channel.owner() != Some(SpeechOwner::ReadAloud) {
            self.state = ReadAloudState::Stopped;
        }
    }
}

pub fn handle_read_aloud_commands(
    mut commands: MessageReader<ReadAloudCommand>,
    mut read_aloud: ResMut<ReadAloud>,
    mut channel: ResMut<SpeechChannel>,
    active: Res<ActiveDocument>,
    gallery: Res<Gallery>,
) {
    for command in commands.read() {
        match command {
            ReadAloudCommand::Play => {
                let Some(item) = active.id().and_then(|id| gallery.get(id)) else {
                    continue;
                };
                read_aloud.play(&mut channel, &item.text_content);
            }
            ReadAloudCommand::Pause => read_aloud.pause(&mut channel),
            ReadAloudCommand::Stop => read_aloud.stop(&mut channel),
        }
    }
}

pub fn stop_on_document_change(
    active: Res<ActiveDocument>,
    mut read_aloud: ResMut<ReadAloud>,
    mut channel: ResMut<SpeechChannel>,
) {
    if active.is_changed() && read_aloud.state() != ReadAloudState::Stopped {
        read_aloud.stop(&mut channel);
    }
}

pub fn sync_read_aloud(mut read_aloud: ResMut<ReadAloud>, channel: Res<SpeechChannel>) {
    if channel.is_changed() {
        read_aloud.sync(&channel);
    }
}
