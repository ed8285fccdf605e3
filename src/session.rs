//! A loaded comment thread and everything that acts on it.
//!
//! The session owns the tree, the option pipeline, the focus and the open
//! editors. Create, edit and delete are split into a synchronous `begin_*`
//! step that validates and marks the node busy, the asynchronous
//! [`PendingMutation::execute`], and [`CommentSession::complete`], which
//! applies the result. A failed call changes nothing in the tree.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, CommentApi, CommentRecord};
use crate::comment_tree::{CommentNode, CommentOrder, CommentTree, NodeId, TreeError};
use crate::navigation::{Command, NavigationController, Transition, reveal};
use crate::options::{OptionError, OptionValue, OptionsPipeline};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("log in to comment")]
    NotLoggedIn,
    #[error("this comment has no id")]
    MissingId,
    #[error("this comment was deleted")]
    Deleted,
    #[error("only the author can do that")]
    NotAuthor,
    #[error("another request for this comment is still running")]
    Busy,
    #[error("no editor is open for this comment")]
    NoEditor,
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// What an editor writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditTarget {
    /// A reply to the node, or a new top-level comment for `None`.
    Reply(Option<NodeId>),
    Edit(NodeId),
}

impl EditTarget {
    pub fn node(self) -> Option<NodeId> {
        match self {
            Self::Reply(node) => node,
            Self::Edit(node) => Some(node),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Editor {
    target: EditTarget,
    initial: String,
    text: String,
    submitting: bool,
    error: Option<String>,
}

impl Editor {
    fn new(target: EditTarget, initial: String) -> Self {
        Self {
            target,
            text: initial.clone(),
            initial,
            submitting: false,
            error: None,
        }
    }

    pub fn target(&self) -> EditTarget {
        self.target
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// The text differs from what the editor was opened with.
    pub fn is_dirty(&self) -> bool {
        self.text != self.initial
    }

    pub fn insert_char(&mut self, c: char) {
        if !self.submitting {
            self.text.push(c);
        }
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if !self.submitting {
            self.text.pop();
        }
    }
}

/// A validated request, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMutation {
    Create {
        parent: Option<NodeId>,
        parent_id: Option<u64>,
        body: String,
    },
    Edit {
        node: NodeId,
        id: u64,
        body: String,
    },
    Delete {
        node: NodeId,
        id: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutput {
    Created(CommentRecord),
    Edited(CommentRecord),
    Deleted,
}

impl PendingMutation {
    /// The node marked busy while this request runs.
    pub fn busy_node(&self) -> Option<NodeId> {
        match self {
            Self::Create { parent, .. } => *parent,
            Self::Edit { node, .. } | Self::Delete { node, .. } => Some(*node),
        }
    }

    fn editor_target(&self) -> Option<EditTarget> {
        match self {
            Self::Create { parent, .. } => Some(EditTarget::Reply(*parent)),
            Self::Edit { node, .. } => Some(EditTarget::Edit(*node)),
            Self::Delete { .. } => None,
        }
    }

    pub async fn execute(&self, api: &dyn CommentApi) -> Result<MutationOutput, ApiError> {
        match self {
            Self::Create {
                parent_id, body, ..
            } => api
                .create_comment(*parent_id, body)
                .await
                .map(MutationOutput::Created),
            Self::Edit { id, body, .. } => api
                .edit_comment(*id, body)
                .await
                .map(MutationOutput::Edited),
            Self::Delete { id, .. } => api
                .delete_comment(*id)
                .await
                .map(|()| MutationOutput::Deleted),
        }
    }
}

pub struct CommentSession {
    tree: CommentTree,
    options: OptionsPipeline,
    nav: NavigationController,
    api: Arc<dyn CommentApi>,
    viewer: Option<u64>,
    editors: HashMap<EditTarget, Editor>,
    active_editor: Option<EditTarget>,
}

impl CommentSession {
    /// Build the tree, run every option over it and focus the first comment.
    pub fn new(
        records: &[CommentRecord],
        order: CommentOrder,
        mut options: OptionsPipeline,
        api: Arc<dyn CommentApi>,
        viewer: Option<u64>,
    ) -> Self {
        options.start();
        let mut tree = CommentTree::from_records(records, order);
        options.process_all(&mut tree);
        options.run_on_load(&mut tree);
        let nav = NavigationController::new(&tree);
        info!(comments = tree.len(), ?order, logged_in = viewer.is_some(), "session ready");
        Self {
            tree,
            options,
            nav,
            api,
            viewer,
            editors: HashMap::new(),
            active_editor: None,
        }
    }

    pub fn tree(&self) -> &CommentTree {
        &self.tree
    }

    pub fn options(&self) -> &OptionsPipeline {
        &self.options
    }

    pub fn api(&self) -> Arc<dyn CommentApi> {
        Arc::clone(&self.api)
    }

    pub fn viewer(&self) -> Option<u64> {
        self.viewer
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.nav.focused()
    }

    pub fn focus(&mut self, id: NodeId) {
        if self.tree.contains(id) {
            self.nav.focus(id);
        }
    }

    pub fn navigate(&mut self, command: Command) -> Transition {
        self.nav.apply(&mut self.tree, command)
    }

    pub fn toggle_order(&mut self) -> CommentOrder {
        self.tree.reverse();
        info!(order = ?self.tree.order(), "comment order toggled");
        self.tree.order()
    }

    pub fn set_option(&mut self, key: &str, value: OptionValue) -> Result<bool, OptionError> {
        let changed = self.options.set(key, value, &mut self.tree)?;
        if changed {
            self.nav.ensure_visible(&self.tree);
        }
        Ok(changed)
    }

    fn node(&self, id: NodeId) -> Result<&CommentNode, SessionError> {
        self.tree
            .get(id)
            .ok_or(SessionError::Tree(TreeError::UnknownNode(id)))
    }

    /// Whether the viewer may reply to `id`; yields the comment id to reply to.
    pub fn check_reply(&self, id: NodeId) -> Result<u64, SessionError> {
        if self.viewer.is_none() {
            return Err(SessionError::NotLoggedIn);
        }
        let node = self.node(id)?;
        if node.deleted {
            return Err(SessionError::Deleted);
        }
        if node.busy {
            return Err(SessionError::Busy);
        }
        node.comment_id.ok_or(SessionError::MissingId)
    }

    /// Like [`Self::check_reply`], and the viewer must also be the author.
    pub fn check_author(&self, id: NodeId) -> Result<u64, SessionError> {
        let comment_id = self.check_reply(id)?;
        let node = self.node(id)?;
        if node.user_id.is_none() || node.user_id != self.viewer {
            return Err(SessionError::NotAuthor);
        }
        Ok(comment_id)
    }

    pub fn can_reply(&self, id: NodeId) -> bool {
        self.check_reply(id).is_ok()
    }

    pub fn can_edit(&self, id: NodeId) -> bool {
        self.check_author(id).is_ok()
    }

    pub fn can_delete(&self, id: NodeId) -> bool {
        self.can_edit(id)
    }

    pub fn editor(&self, target: EditTarget) -> Option<&Editor> {
        self.editors.get(&target)
    }

    pub fn active_editor(&self) -> Option<&Editor> {
        self.editors.get(&self.active_editor?)
    }

    pub fn active_editor_mut(&mut self) -> Option<&mut Editor> {
        self.editors.get_mut(&self.active_editor?)
    }

    /// Whether controls for `id` should be hidden: an editor is open on it
    /// or a request is running.
    pub fn controls_hidden(&self, id: NodeId) -> bool {
        self.tree.get(id).is_some_and(|node| node.busy)
            || self.editors.contains_key(&EditTarget::Reply(Some(id)))
            || self.editors.contains_key(&EditTarget::Edit(id))
    }

    /// Open (or return to) an editor for a reply to `parent`, or for a new
    /// top-level comment.
    pub fn open_reply(&mut self, parent: Option<NodeId>) -> Result<EditTarget, SessionError> {
        match parent {
            Some(id) => {
                self.check_reply(id)?;
            }
            None if self.viewer.is_none() => return Err(SessionError::NotLoggedIn),
            None => {}
        }
        Ok(self.open_editor(EditTarget::Reply(parent), String::new()))
    }

    pub fn open_edit(&mut self, id: NodeId) -> Result<EditTarget, SessionError> {
        self.check_author(id)?;
        let body = self.node(id)?.body.clone().unwrap_or_default();
        Ok(self.open_editor(EditTarget::Edit(id), body))
    }

    fn open_editor(&mut self, target: EditTarget, initial: String) -> EditTarget {
        self.editors
            .entry(target)
            .or_insert_with(|| Editor::new(target, initial));
        self.active_editor = Some(target);
        target
    }

    /// Close an editor. A dirty editor stays open unless `confirmed`;
    /// returns whether it was closed.
    pub fn cancel_editor(&mut self, target: EditTarget, confirmed: bool) -> bool {
        let Some(editor) = self.editors.get(&target) else {
            return true;
        };
        if editor.submitting || (editor.is_dirty() && !confirmed) {
            return false;
        }
        self.close_editor(target);
        true
    }

    fn close_editor(&mut self, target: EditTarget) {
        self.editors.remove(&target);
        if self.active_editor == Some(target) {
            self.active_editor = None;
        }
    }

    /// Validate an editor's text and turn it into a request. An empty reply
    /// or an unchanged edit closes the editor and yields `None`.
    pub fn begin_submit(
        &mut self,
        target: EditTarget,
    ) -> Result<Option<PendingMutation>, SessionError> {
        let editor = self.editors.get(&target).ok_or(SessionError::NoEditor)?;
        if editor.submitting {
            return Err(SessionError::Busy);
        }
        let body = editor.text.clone();
        let unchanged = body.trim().is_empty()
            || (matches!(target, EditTarget::Edit(_)) && body == editor.initial);
        if unchanged {
            self.close_editor(target);
            return Ok(None);
        }

        let pending = match target {
            EditTarget::Reply(parent) => {
                let parent_id = match parent {
                    Some(id) => Some(self.check_reply(id)?),
                    None if self.viewer.is_none() => return Err(SessionError::NotLoggedIn),
                    None => None,
                };
                PendingMutation::Create {
                    parent,
                    parent_id,
                    body,
                }
            }
            EditTarget::Edit(node) => PendingMutation::Edit {
                node,
                id: self.check_author(node)?,
                body,
            },
        };

        if let Some(editor) = self.editors.get_mut(&target) {
            editor.submitting = true;
            editor.error = None;
        }
        self.set_busy(&pending, true);
        Ok(Some(pending))
    }

    /// Validate a delete request for `id`. The caller is expected to have
    /// confirmed it with the user.
    pub fn begin_delete(&mut self, id: NodeId) -> Result<PendingMutation, SessionError> {
        let comment_id = self.check_author(id)?;
        let pending = PendingMutation::Delete {
            node: id,
            id: comment_id,
        };
        self.set_busy(&pending, true);
        Ok(pending)
    }

    fn set_busy(&mut self, pending: &PendingMutation, busy: bool) {
        if let Some(node) = pending.busy_node().and_then(|id| self.tree.get_mut(id)) {
            node.busy = busy;
        }
    }

    /// Apply the outcome of a request. Returns the node that now holds focus
    /// on success. On failure the tree is left as it was and the editor, if
    /// any, stays open with the error.
    pub fn complete(
        &mut self,
        pending: PendingMutation,
        result: Result<MutationOutput, ApiError>,
    ) -> Result<Option<NodeId>, SessionError> {
        self.set_busy(&pending, false);
        let applied = result
            .map_err(SessionError::from)
            .and_then(|output| self.apply(&pending, output));
        match applied {
            Ok(focus) => {
                info!(?pending, "comment request succeeded");
                if let Some(target) = pending.editor_target() {
                    self.close_editor(target);
                }
                Ok(focus)
            }
            Err(err) => {
                warn!(error = %err, ?pending, "comment request failed");
                if let Some(editor) = pending
                    .editor_target()
                    .and_then(|target| self.editors.get_mut(&target))
                {
                    editor.submitting = false;
                    editor.error = Some(err.user_message());
                }
                Err(err)
            }
        }
    }

    fn apply(
        &mut self,
        pending: &PendingMutation,
        output: MutationOutput,
    ) -> Result<Option<NodeId>, SessionError> {
        match (pending, output) {
            (PendingMutation::Create { parent, .. }, MutationOutput::Created(record)) => {
                let id = self.tree.insert(*parent, &record)?;
                self.options.process_node(&mut self.tree, id);
                reveal(&mut self.tree, id);
                self.nav.focus(id);
                self.nav.ensure_visible(&self.tree);
                Ok(self.nav.focused())
            }
            (PendingMutation::Edit { node, .. }, MutationOutput::Edited(record)) => {
                self.tree
                    .get_mut(*node)
                    .ok_or(TreeError::UnknownNode(*node))?
                    .apply_edit(&record);
                self.options.refresh_edited(&mut self.tree, *node);
                Ok(Some(*node))
            }
            (PendingMutation::Delete { node, .. }, MutationOutput::Deleted) => {
                self.apply_delete(*node)
            }
            (_, output) => Err(SessionError::Api(ApiError::Parse(format!(
                "unexpected response {output:?}"
            )))),
        }
    }

    fn apply_delete(&mut self, id: NodeId) -> Result<Option<NodeId>, SessionError> {
        let node = self.node(id)?;
        let has_replies = !node.children().is_empty();
        let fallback = node
            .prev_sibling()
            .or(node.next_sibling())
            .or(node.parent());
        self.close_editor(EditTarget::Reply(Some(id)));
        self.close_editor(EditTarget::Edit(id));
        if has_replies {
            if let Some(node) = self.tree.get_mut(id) {
                node.tombstone();
            }
        } else {
            self.tree.remove(id)?;
            self.nav.repair(&self.tree, fallback);
        }
        Ok(self.nav.focused())
    }

    /// Submit an editor and wait for the result.
    pub async fn submit(&mut self, target: EditTarget) -> Result<Option<NodeId>, SessionError> {
        let Some(pending) = self.begin_submit(target)? else {
            return Ok(None);
        };
        let api = self.api();
        let result = pending.execute(api.as_ref()).await;
        self.complete(pending, result)
    }

    /// Delete a comment and wait for the result.
    pub async fn delete(&mut self, id: NodeId) -> Result<Option<NodeId>, SessionError> {
        let pending = self.begin_delete(id)?;
        let api = self.api();
        let result = pending.execute(api.as_ref()).await;
        self.complete(pending, result)
    }
}
