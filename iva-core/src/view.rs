use serde::Serialize;

use crate::conversation::ConversationLog;
use crate::session::Session;
use crate::text;
use crate::types::{MessageId, RecorderState, Role, View};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub busy: bool,
    pub submit_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageLine {
    /// Stable render key; `None` only on the transient line.
    pub id: Option<MessageId>,
    pub role: Role,
    pub text: String,
    /// Set on the transient "processing" line, which is not part of the log.
    pub transient: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationView {
    pub title: String,
    pub lines: Vec<MessageLine>,
    pub processing: bool,
    pub recording: bool,
    pub mic_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ViewModel {
    Login(FormView),
    Register(FormView),
    Conversation(ConversationView),
}

/// Project client state onto exactly one screen.
pub fn render(
    session: &Session,
    log: &ConversationLog,
    loading: bool,
    recorder: RecorderState,
) -> ViewModel {
    match (session.view(), session.identity()) {
        (View::Authenticated, Some(identity)) => {
            let mut lines: Vec<MessageLine> = log
                .messages()
                .iter()
                .map(|m| MessageLine {
                    id: Some(m.id),
                    role: m.role,
                    text: m.text.clone(),
                    transient: false,
                })
                .collect();
            if loading {
                lines.push(MessageLine {
                    id: None,
                    role: Role::Assistant,
                    text: text::PROCESSING.into(),
                    transient: true,
                });
            }

            let recording = recorder == RecorderState::Capturing;
            ViewModel::Conversation(ConversationView {
                title: text::conversation_title(&identity.name),
                lines,
                processing: loading,
                recording,
                mic_label: if recording {
                    text::LISTENING.into()
                } else {
                    text::HOLD_TO_TALK.into()
                },
            })
        }
        (View::Register, _) => ViewModel::Register(FormView {
            busy: loading,
            submit_label: if loading { text::PROCESSING } else { text::REGISTER }.into(),
        }),
        _ => ViewModel::Login(FormView {
            busy: loading,
            submit_label: if loading { text::VERIFYING } else { text::LOG_IN }.into(),
        }),
    }
}
