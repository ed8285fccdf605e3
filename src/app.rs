use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::comment_tree::NodeId;
use crate::navigation::{Command, Transition};
use crate::session::{CommentSession, EditTarget, MutationOutput, PendingMutation};
use crate::widgets::thread_view::ThreadViewState;

/// A finished comment request, sent back from its task.
pub struct MutationResult {
    pub pending: PendingMutation,
    pub result: Result<MutationOutput, ApiError>,
}

/// A popup that takes every key until answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    DeleteComment(NodeId),
    DiscardEdits(EditTarget),
    /// A comment request failed. Any key acknowledges it.
    Failed(String),
}

impl Prompt {
    pub fn question(&self) -> &str {
        match self {
            Self::DeleteComment(_) => "Delete this comment?",
            Self::DiscardEdits(_) => "Discard your changes?",
            Self::Failed(message) => message,
        }
    }

    /// Whether this is a yes/no question rather than a notice.
    pub fn is_question(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Navigate(Command),
    ToggleOrder,
    Reply,
    NewComment,
    Edit,
    Delete,
    OpenLink,
    OpenProfile,
    ToggleHelp,
    Quit,
    // Editor
    EditorInput(char),
    EditorNewline,
    EditorBackspace,
    SubmitEditor,
    CancelEditor,
    // Prompt
    Confirm,
    Dismiss,
}

pub struct App {
    pub session: CommentSession,
    pub title: String,
    pub thread: ThreadViewState,
    pub prompt: Option<Prompt>,
    pub show_help: bool,
    pub status: Option<String>,
    pub error: Option<String>,
    pub should_quit: bool,
    pub result_tx: mpsc::Sender<MutationResult>,
    pub result_rx: mpsc::Receiver<MutationResult>,
}

impl App {
    pub fn new(session: CommentSession, title: impl Into<String>) -> Self {
        let (result_tx, result_rx) = mpsc::channel(10);
        Self {
            session,
            title: title.into(),
            thread: ThreadViewState::default(),
            prompt: None,
            show_help: false,
            status: None,
            error: None,
            should_quit: false,
            result_tx,
            result_rx,
        }
    }

    pub fn editing(&self) -> bool {
        self.session.active_editor().is_some()
    }

    pub fn update(&mut self, msg: Message) {
        self.error = None;

        match msg {
            Message::Navigate(command) => {
                let transition = self.session.navigate(command);
                debug!(?command, ?transition, "navigate");
                if let Transition::Toggled { expanded, .. } = transition {
                    self.status = Some(if expanded { "Expanded" } else { "Collapsed" }.into());
                }
            }
            Message::ToggleOrder => {
                let order = self.session.toggle_order();
                self.status = Some(format!("Order: {}", order.label()));
            }
            Message::Reply => {
                if let Some(id) = self.session.focused() {
                    self.open_reply(Some(id));
                }
            }
            Message::NewComment => self.open_reply(None),
            Message::Edit => self.open_edit(),
            Message::Delete => self.request_delete(),
            Message::OpenLink => self.open_link(),
            Message::OpenProfile => self.open_profile(),
            Message::ToggleHelp => self.show_help = !self.show_help,
            Message::Quit => self.should_quit = true,
            Message::EditorInput(c) => {
                if let Some(editor) = self.session.active_editor_mut() {
                    editor.insert_char(c);
                }
            }
            Message::EditorNewline => {
                if let Some(editor) = self.session.active_editor_mut() {
                    editor.insert_newline();
                }
            }
            Message::EditorBackspace => {
                if let Some(editor) = self.session.active_editor_mut() {
                    editor.backspace();
                }
            }
            Message::SubmitEditor => self.submit_editor(),
            Message::CancelEditor => self.cancel_editor(),
            Message::Confirm => self.confirm_prompt(),
            Message::Dismiss => self.prompt = None,
        }
    }

    fn open_reply(&mut self, parent: Option<NodeId>) {
        if let Err(err) = self.session.open_reply(parent) {
            self.error = Some(err.user_message());
        }
    }

    fn open_edit(&mut self) {
        let Some(id) = self.session.focused() else {
            return;
        };
        if let Err(err) = self.session.open_edit(id) {
            self.error = Some(err.user_message());
        }
    }

    fn request_delete(&mut self) {
        let Some(id) = self.session.focused() else {
            return;
        };
        match self.session.check_author(id) {
            Ok(_) => self.prompt = Some(Prompt::DeleteComment(id)),
            Err(err) => self.error = Some(err.user_message()),
        }
    }

    fn confirm_prompt(&mut self) {
        match self.prompt.take() {
            Some(Prompt::DeleteComment(id)) => match self.session.begin_delete(id) {
                Ok(pending) => {
                    self.status = Some("Deleting…".into());
                    self.spawn_mutation(pending);
                }
                Err(err) => self.error = Some(err.user_message()),
            },
            Some(Prompt::DiscardEdits(target)) => {
                self.session.cancel_editor(target, true);
            }
            Some(Prompt::Failed(_)) | None => {}
        }
    }

    fn submit_editor(&mut self) {
        let Some(target) = self.session.active_editor().map(|editor| editor.target()) else {
            return;
        };
        match self.session.begin_submit(target) {
            Ok(Some(pending)) => {
                self.status = Some("Sending…".into());
                self.spawn_mutation(pending);
            }
            Ok(None) => {}
            Err(err) => self.error = Some(err.user_message()),
        }
    }

    fn cancel_editor(&mut self) {
        let Some(editor) = self.session.active_editor() else {
            return;
        };
        let target = editor.target();
        let submitting = editor.is_submitting();
        if !self.session.cancel_editor(target, false) && !submitting {
            self.prompt = Some(Prompt::DiscardEdits(target));
        }
    }

    fn open_link(&mut self) {
        let link = self
            .session
            .focused()
            .and_then(|id| self.session.tree().get(id))
            .and_then(|node| node.first_link().map(str::to_string));
        match link {
            Some(link) => self.open_external(&link),
            None => self.error = Some("No link in this comment".into()),
        }
    }

    fn open_profile(&mut self) {
        let url = self
            .session
            .focused()
            .and_then(|id| self.session.tree().get(id))
            .and_then(|node| node.profile_url());
        match url {
            Some(url) => self.open_external(&url),
            None => self.error = Some("No profile for this commenter".into()),
        }
    }

    fn open_external(&mut self, target: &str) {
        if let Err(err) = open::that(target) {
            warn!(%target, error = %err, "failed to open link");
            self.error = Some(format!("Could not open {target}"));
        }
    }

    /// Send a request on a background task. The result comes back through
    /// `result_rx`.
    fn spawn_mutation(&mut self, pending: PendingMutation) {
        let api = self.session.api();
        let tx = self.result_tx.clone();
        tokio::spawn(async move {
            let result = pending.execute(api.as_ref()).await;
            let _ = tx.send(MutationResult { pending, result }).await;
        });
    }

    pub fn handle_async_result(&mut self, result: MutationResult) {
        let MutationResult { pending, result } = result;
        let done = match &pending {
            PendingMutation::Create { .. } => "Comment posted",
            PendingMutation::Edit { .. } => "Comment updated",
            PendingMutation::Delete { .. } => "Comment deleted",
        };
        match self.session.complete(pending, result) {
            Ok(_) => self.status = Some(done.into()),
            Err(err) => {
                let message = err.user_message();
                self.status = None;
                self.error = Some(message.clone());
                self.prompt = Some(Prompt::Failed(message));
            }
        }
    }
}
