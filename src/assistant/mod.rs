//! Voice assistant: listen, ask the AI about the open document, speak the reply.

mod client;

pub use client::{AiClient, AiError, GeminiClient};

use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use futures_lite::future;

use crate::documents::{ActiveDocument, Gallery};
use crate::speech::{SpeechChannel, SpeechFinished, SpeechInput, SpeechOwner, TypedSpeechInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiStatus {
    #[default]
    Idle,
    Listening,
    Thinking,
    Speaking,
}

impl AiStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AiStatus::Idle => "Ask AI",
            AiStatus::Listening => "Listening...",
            AiStatus::Thinking => "Thinking...",
            AiStatus::Speaking => "Speaking...",
        }
    }
}

/// Question to send: the document text as context plus the user's utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct AiQuery {
    pub document_text: String,
    pub utterance: String,
}

#[derive(Resource, Debug, Default)]
pub struct Assistant {
    status: AiStatus,
    /// Last failure, shown next to the assistant button
    pub error: Option<String>,
}

impl Assistant {
    pub fn status(&self) -> AiStatus {
        self.status
    }

    /// Start listening from idle; from any other state, stop everything.
    pub fn toggle(&mut self, input: &mut dyn SpeechInput, speech: &mut SpeechChannel) {
        if self.status == AiStatus::Idle {
            self.error = None;
            input.start_listening();
            self.status = AiStatus::Listening;
        } else {
            self.reset(input, speech);
        }
    }

    fn reset(&mut self, input: &mut dyn SpeechInput, speech: &mut SpeechChannel) {
        input.stop_listening();
        speech.stop(SpeechOwner::Assistant);
        self.status = AiStatus::Idle;
    }

    /// A transcript arrived. Returns the query to send, if any.
    pub fn on_transcript(
        &mut self,
        transcript: String,
        client_configured: bool,
        document_text: Option<&str>,
        input: &mut dyn SpeechInput,
        speech: &mut SpeechChannel,
    ) -> Option<AiQuery> {
        if self.status != AiStatus::Listening {
            return None;
        }
        if !client_configured {
            self.error = Some(AiError::MissingCredential.to_string());
            self.reset(input, speech);
            return None;
        }
        let Some(document_text) = document_text else {
            self.reset(input, speech);
            return None;
        };

        self.status = AiStatus::Thinking;
        Some(AiQuery {
            document_text: document_text.to_string(),
            utterance: transcript,
        })
    }

    /// The AI answered (or failed). Ignored unless still thinking.
    pub fn on_reply(
        &mut self,
        reply: Result<String, AiError>,
        input: &mut dyn SpeechInput,
        speech: &mut SpeechChannel,
    ) {
        if self.status != AiStatus::Thinking {
            return;
        }
        match reply {
            Ok(text) => match speech.speak(SpeechOwner::Assistant, &text) {
                Ok(()) => self.status = AiStatus::Speaking,
                Err(e) => {
                    error!("Assistant reply could not be spoken: {}", e);
                    self.reset(input, speech);
                }
            },
            Err(e) => {
                error!("AI request failed: {:?}", e);
                self.error = Some(e.to_string());
                self.reset(input, speech);
            }
        }
    }

    pub fn on_speech_finished(&mut self) {
        if self.status == AiStatus::Speaking {
            self.status = AiStatus::Idle;
        }
    }

    /// Read-aloud can take over the speech channel mid-reply.
    pub fn sync(&mut self, speech: &SpeechChannel) {
        if self.status == AiStatus::Speaking && speech.owner() != Some(SpeechOwner::Assistant) {
            self.status = AiStatus::Idle;
        }
    }
}

#[derive(Resource, Clone)]
pub struct AiBackend(pub Arc<dyn AiClient>);

impl Default for AiBackend {
    fn default() -> Self {
        Self(Arc::new(GeminiClient::from_env()))
    }
}

#[derive(Message, Debug, Clone, Copy)]
pub struct ToggleAssistant;

#[derive(Component)]
pub struct AiQueryTask(pub Task<Result<String, AiError>>);

fn handle_toggle(
    mut commands: Commands,
    mut events: MessageReader<ToggleAssistant>,
    mut assistant: ResMut<Assistant>,
    mut input: ResMut<TypedSpeechInput>,
    mut speech: ResMut<SpeechChannel>,
    tasks: Query<Entity, With<AiQueryTask>>,
) {
    for _ in events.read() {
        assistant.toggle(&mut *input, &mut speech);
        if assistant.status() == AiStatus::Idle {
            // A reply arriving after cancel is dropped with its task
            for entity in tasks.iter() {
                commands.entity(entity).despawn();
            }
        }
    }
}

fn handle_transcripts(
    mut commands: Commands,
    mut assistant: ResMut<Assistant>,
    mut input: ResMut<TypedSpeechInput>,
    mut speech: ResMut<SpeechChannel>,
    backend: Res<AiBackend>,
    active: Res<ActiveDocument>,
    gallery: Res<Gallery>,
) {
    let Some(transcript) = input.take_transcript() else {
        return;
    };
    let item = active.id().and_then(|id| gallery.get(id));
    let query = assistant.on_transcript(
        transcript,
        backend.0.is_configured(),
        item.map(|item| item.text_content.as_str()),
        &mut *input,
        &mut speech,
    );

    if let Some(query) = query {
        info!("Asking the assistant ({} chars of context)", query.document_text.len());
        let client = backend.0.clone();
        let task = AsyncComputeTaskPool::get()
            .spawn(async move { client.ask(&query.document_text, &query.utterance) });
        commands.spawn(AiQueryTask(task));
    }
}

fn poll_ai_queries(
    mut commands: Commands,
    mut tasks: Query<(Entity, &mut AiQueryTask)>,
    mut assistant: ResMut<Assistant>,
    mut input: ResMut<TypedSpeechInput>,
    mut speech: ResMut<SpeechChannel>,
) {
    for (entity, mut task) in tasks.iter_mut() {
        if let Some(reply) = future::block_on(future::poll_once(&mut task.0)) {
            commands.entity(entity).despawn();
            assistant.on_reply(reply, &mut *input, &mut speech);
        }
    }
}

fn handle_speech_finished(
    mut finished: MessageReader<SpeechFinished>,
    mut assistant: ResMut<Assistant>,
    speech: Res<SpeechChannel>,
) {
    for event in finished.read() {
        if event.owner == SpeechOwner::Assistant {
            assistant.on_speech_finished();
        }
    }
    assistant.sync(&speech);
}

pub struct AssistantPlugin;

impl Plugin for AssistantPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Assistant>()
            .init_resource::<AiBackend>()
            .add_message::<ToggleAssistant>()
            .add_systems(
                Update,
                (
                    handle_toggle.run_if(on_message::<ToggleAssistant>),
                    handle_transcripts,
                    poll_ai_queries,
                    handle_speech_finished,
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Default)]
    struct FakeInput {
        listening: bool,
        starts: usize,
    }

    impl SpeechInput for FakeInput {
        fn start_listening(&mut self) {
            self.listening = true;
            self.starts += 1;
        }

        fn stop_listening(&mut self) {
            self.listening = false;
        }

        fn is_listening(&self) -> bool {
            self.listening
        }

        fn take_transcript(&mut self) -> Option<String> {
            None
        }
    }

    struct Fixture {
        assistant: Assistant,
        input: FakeInput,
        speech: SpeechChannel,
    }

    impl Fixture {
        fn listening() -> Self {
            let mut f = Self {
                assistant: Assistant::default(),
                input: FakeInput::default(),
                speech: SpeechChannel::default(),
            };
            f.assistant.toggle(&mut f.input, &mut f.speech);
            f
        }

        fn transcript(&mut self, configured: bool, document: Option<&str>) -> Option<AiQuery> {
            self.assistant.on_transcript(
                "What is this?".to_string(),
                configured,
                document,
                &mut self.input,
                &mut self.speech,
            )
        }

        fn reply(&mut self, reply: Result<String, AiError>) {
            self.assistant
                .on_reply(reply, &mut self.input, &mut self.speech);
        }
    }

    #[test]
    fn test_full_round_trip() {
        let mut f = Fixture::listening();
        assert_eq!(f.assistant.status(), AiStatus::Listening);
        assert!(f.input.listening);

        let query = f.transcript(true, Some("Doc text")).unwrap();
        assert_eq!(query.document_text, "Doc text");
        assert_eq!(query.utterance, "What is this?");
        assert_eq!(f.assistant.status(), AiStatus::Thinking);

        f.reply(Ok("It is a report.".to_string()));
        assert_eq!(f.assistant.status(), AiStatus::Speaking);
        assert_eq!(f.speech.owner(), Some(SpeechOwner::Assistant));

        let finished = f.speech.tick(Duration::from_secs(10));
        assert_eq!(finished, Some(SpeechOwner::Assistant));
        f.assistant.on_speech_finished();
        assert_eq!(f.assistant.status(), AiStatus::Idle);
    }

    #[test]
    fn test_missing_credential_reports_and_idles() {
        let mut f = Fixture::listening();
        assert!(f.transcript(false, Some("Doc")).is_none());
        assert_eq!(f.assistant.status(), AiStatus::Idle);
        assert_eq!(f.assistant.error.as_deref(), Some("Gemini API key is not configured."));
        assert!(!f.input.listening);
    }

    #[test]
    fn test_no_document_ignores_transcript() {
        let mut f = Fixture::listening();
        assert!(f.transcript(true, None).is_none());
        assert_eq!(f.assistant.status(), AiStatus::Idle);
        assert!(f.assistant.error.is_none());
    }

    #[test]
    fn test_request_failure_message() {
        let mut f = Fixture::listening();
        f.transcript(true, Some("Doc"));
        f.reply(Err(AiError::Request("500".to_string())));
        assert_eq!(f.assistant.status(), AiStatus::Idle);
        assert_eq!(f.assistant.error.as_deref(), Some("Sorry, I encountered an error."));
    }

    #[test]
    fn test_toggle_while_speaking_stops_output() {
        let mut f = Fixture::listening();
        f.transcript(true, Some("Doc"));
        f.reply(Ok("A long answer".to_string()));
        f.assistant.toggle(&mut f.input, &mut f.speech);
        assert_eq!(f.assistant.status(), AiStatus::Idle);
        assert_eq!(f.speech.owner(), None);
    }

    #[test]
    fn test_late_reply_after_cancel_is_ignored() {
        let mut f = Fixture::listening();
        f.transcript(true, Some("Doc"));
        f.assistant.toggle(&mut f.input, &mut f.speech);
        f.reply(Ok("too late".to_string()));
        assert_eq!(f.assistant.status(), AiStatus::Idle);
        assert_eq!(f.speech.owner(), None);
    }

    #[test]
    fn test_read_aloud_takeover_ends_speaking() {
        let mut f = Fixture::listening();
        f.transcript(true, Some("Doc"));
        f.reply(Ok("answer".to_string()));
        f.speech.speak(SpeechOwner::ReadAloud, "document").unwrap();
        f.assistant.sync(&f.speech);
        assert_eq!(f.assistant.status(), AiStatus::Idle);
    }

    #[test]
    fn test_toggle_clears_previous_error() {
        let mut f = Fixture::listening();
        f.transcript(false, Some("Doc"));
        assert!(f.assistant.error.is_some());
        f.assistant.toggle(&mut f.input, &mut f.speech);
        assert!(f.assistant.error.is_none());
        assert_eq!(f.input.starts, 2);
    }
}
