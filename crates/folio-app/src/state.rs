// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::error::NO_FILE_SELECTED;
use crate::{
    ChatRequest, ChatSender, ChatTurn, ChatVisibility, ErrorToken, FlowError, PortfolioSnapshot,
    RequestId, SUGGESTED_QUESTIONS, SelectedFile, Theme,
};

/// How long an error stays on screen unless a newer one replaces it.
pub const ERROR_DISPLAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading {
        request_id: RequestId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatPhase {
    #[default]
    Idle,
    Pending {
        request_id: RequestId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorToast {
    pub message: String,
    pub token: ErrorToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub selected_file: Option<SelectedFile>,
    pub upload: UploadPhase,
    pub chat_phase: ChatPhase,
    pub error: Option<ErrorToast>,
    pub composer: String,
    pub theme: Theme,
    pub chat: ChatVisibility,
    pub snapshot: PortfolioSnapshot,
    pub transcript: Vec<ChatTurn>,
    pub status_line: Option<String>,
    last_request: RequestId,
    last_error: ErrorToken,
    next_suggestion: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            selected_file: None,
            upload: UploadPhase::Idle,
            chat_phase: ChatPhase::Idle,
            error: None,
            composer: String::new(),
            theme: Theme::Dark,
            chat: ChatVisibility::Hidden,
            snapshot: PortfolioSnapshot::default(),
            transcript: Vec::new(),
            status_line: None,
            last_request: RequestId::default(),
            last_error: ErrorToken::default(),
            next_suggestion: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerEdit {
    Insert(char),
    Newline,
    Backspace,
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    SelectFile(SelectedFile),
    SubmitUpload,
    UploadSettled {
        request_id: RequestId,
        outcome: Result<PortfolioSnapshot, FlowError>,
    },
    Compose(ComposerEdit),
    NextSuggestion,
    SubmitChat,
    ChatSettled {
        request_id: RequestId,
        outcome: Result<String, FlowError>,
    },
    ToggleTheme,
    ToggleChat,
    CloseChat,
    ReportError(String),
    ExpireError(ErrorToken),
    DismissError,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    FileSelected(SelectedFile),
    UploadRequested {
        request_id: RequestId,
        file: SelectedFile,
    },
    SnapshotReplaced,
    ComposerChanged,
    TurnAppended(ChatSender),
    ChatRequested {
        request_id: RequestId,
        request: ChatRequest,
    },
    StaleResponseDropped(RequestId),
    ThemeChanged(Theme),
    ChatVisibilityChanged(ChatVisibility),
    ErrorRaised {
        token: ErrorToken,
        message: String,
    },
    ErrorCleared,
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn with_preferences(theme: Theme, chat: ChatVisibility) -> Self {
        Self {
            theme,
            chat,
            ..Self::default()
        }
    }

    pub const fn is_uploading(&self) -> bool {
        matches!(self.upload, UploadPhase::Uploading { .. })
    }

    pub const fn is_chat_pending(&self) -> bool {
        matches!(self.chat_phase, ChatPhase::Pending { .. })
    }

    pub const fn can_submit_upload(&self) -> bool {
        !self.is_uploading()
    }

    pub fn can_submit_chat(&self) -> bool {
        !self.is_chat_pending() && !self.composer.trim().is_empty()
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SelectFile(file) => {
                self.selected_file = Some(file.clone());
                let mut events = vec![AppEvent::FileSelected(file)];
                events.extend(self.clear_error());
                events
            }
            AppCommand::SubmitUpload => self.submit_upload(),
            AppCommand::UploadSettled {
                request_id,
                outcome,
            } => self.settle_upload(request_id, outcome),
            AppCommand::Compose(edit) => self.compose(edit),
            AppCommand::NextSuggestion => {
                if !self.transcript.is_empty() || self.is_chat_pending() {
                    return Vec::new();
                }
                let index = self.next_suggestion % SUGGESTED_QUESTIONS.len();
                self.next_suggestion = index + 1;
                self.composer = SUGGESTED_QUESTIONS[index].to_owned();
                vec![AppEvent::ComposerChanged]
            }
            AppCommand::SubmitChat => self.submit_chat(),
            AppCommand::ChatSettled {
                request_id,
                outcome,
            } => self.settle_chat(request_id, outcome),
            AppCommand::ToggleTheme => {
                self.theme = self.theme.toggled();
                vec![AppEvent::ThemeChanged(self.theme)]
            }
            AppCommand::ToggleChat => {
                let next = match self.chat {
                    ChatVisibility::Hidden => ChatVisibility::Visible,
                    ChatVisibility::Visible => ChatVisibility::Hidden,
                };
                self.set_chat_visibility(next)
            }
            AppCommand::CloseChat => {
                if self.chat == ChatVisibility::Hidden {
                    return Vec::new();
                }
                self.set_chat_visibility(ChatVisibility::Hidden)
            }
            AppCommand::ReportError(message) => vec![self.raise_error(message)],
            AppCommand::ExpireError(token) => {
                if self.error.as_ref().map(|toast| toast.token) != Some(token) {
                    return Vec::new();
                }
                self.clear_error().into_iter().collect()
            }
            AppCommand::DismissError => self.clear_error().into_iter().collect(),
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn submit_upload(&mut self) -> Vec<AppEvent> {
        if self.is_uploading() {
            return Vec::new();
        }
        let Some(file) = self.selected_file.clone() else {
            let error = FlowError::Validation(NO_FILE_SELECTED.to_owned());
            return vec![self.raise_error(error.to_string())];
        };

        let request_id = self.issue_request();
        self.upload = UploadPhase::Uploading { request_id };
        let mut events = self.clear_error().into_iter().collect::<Vec<_>>();
        events.push(AppEvent::UploadRequested { request_id, file });
        events
    }

    fn settle_upload(
        &mut self,
        request_id: RequestId,
        outcome: Result<PortfolioSnapshot, FlowError>,
    ) -> Vec<AppEvent> {
        match self.upload {
            UploadPhase::Uploading { request_id: current } if current == request_id => {}
            _ => return vec![AppEvent::StaleResponseDropped(request_id)],
        }

        self.upload = UploadPhase::Idle;
        match outcome {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                vec![AppEvent::SnapshotReplaced]
            }
            Err(error) => vec![self.raise_error(error.to_string())],
        }
    }

    fn compose(&mut self, edit: ComposerEdit) -> Vec<AppEvent> {
        if self.is_chat_pending() {
            return Vec::new();
        }
        match edit {
            ComposerEdit::Insert(ch) => self.composer.push(ch),
            ComposerEdit::Newline => self.composer.push('\n'),
            ComposerEdit::Backspace => {
                if self.composer.pop().is_none() {
                    return Vec::new();
                }
            }
            ComposerEdit::Clear => {
                if self.composer.is_empty() {
                    return Vec::new();
                }
                self.composer.clear();
            }
        }
        vec![AppEvent::ComposerChanged]
    }

    fn submit_chat(&mut self) -> Vec<AppEvent> {
        if self.is_chat_pending() {
            return Vec::new();
        }
        let message = self.composer.trim().to_owned();
        if message.is_empty() {
            return Vec::new();
        }

        self.transcript.push(ChatTurn::user(message.clone()));
        self.composer.clear();
        let request_id = self.issue_request();
        self.chat_phase = ChatPhase::Pending { request_id };

        let mut events = vec![AppEvent::TurnAppended(ChatSender::User)];
        events.extend(self.clear_error());
        events.push(AppEvent::ChatRequested {
            request_id,
            request: ChatRequest {
                message,
                chat_history: self.transcript.clone(),
                portfolio_data: self.snapshot.context(),
            },
        });
        events
    }

    fn settle_chat(
        &mut self,
        request_id: RequestId,
        outcome: Result<String, FlowError>,
    ) -> Vec<AppEvent> {
        match self.chat_phase {
            ChatPhase::Pending { request_id: current } if current == request_id => {}
            _ => return vec![AppEvent::StaleResponseDropped(request_id)],
        }

        self.chat_phase = ChatPhase::Idle;
        match outcome {
            Ok(reply) => {
                self.transcript.push(ChatTurn::assistant(reply));
                vec![AppEvent::TurnAppended(ChatSender::Assistant)]
            }
            Err(error) => vec![self.raise_error(error.to_string())],
        }
    }

    fn set_chat_visibility(&mut self, chat: ChatVisibility) -> Vec<AppEvent> {
        self.chat = chat;
        let label = match chat {
            ChatVisibility::Visible => "chat open",
            ChatVisibility::Hidden => "chat hidden",
        };
        vec![
            AppEvent::ChatVisibilityChanged(self.chat),
            self.set_status(label),
        ]
    }

    fn issue_request(&mut self) -> RequestId {
        self.last_request = self.last_request.next();
        self.last_request
    }

    fn raise_error(&mut self, message: String) -> AppEvent {
        self.last_error = self.last_error.next();
        self.error = Some(ErrorToast {
            message: message.clone(),
            token: self.last_error,
        });
        AppEvent::ErrorRaised {
            token: self.last_error,
            message,
        }
    }

    fn clear_error(&mut self) -> Option<AppEvent> {
        self.error.take().map(|_| AppEvent::ErrorCleared)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
