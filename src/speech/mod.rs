//! Speech output and input collaborators, plus document read-aloud.

pub mod input;
mod output;
mod read_aloud;

pub use input::{SpeechInput, TypedSpeechInput};
pub use output::{
    CaptionVoice, SpeechChannel, SpeechError, SpeechFinished, SpeechOutput, SpeechOwner,
};
pub use read_aloud::{ReadAloud, ReadAloudCommand, ReadAloudState};

use bevy::prelude::*;

pub struct SpeechPlugin;

impl Plugin for SpeechPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpeechChannel>()
            .init_resource::<TypedSpeechInput>()
            .init_resource::<ReadAloud>()
            .add_message::<SpeechFinished>()
            .add_message::<ReadAloudCommand>()
            .add_systems(
                Update,
                (
                    read_aloud::stop_on_document_change,
                    read_aloud::handle_read_aloud_commands
                        .run_if(on_message::<ReadAloudCommand>),
                    output::tick_speech,
                    read_aloud::sync_read_aloud,
                )
                    .chain(),
            );
    }
}
