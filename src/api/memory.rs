//! In-memory comment service for demo mode and tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::types::CommentRecord;
use super::{ApiError, CommentApi};

#[derive(Debug)]
struct MemoryState {
    next_id: u64,
    fail_next: Option<ApiError>,
    calls: Vec<MemoryCall>,
}

/// A call observed by [`MemoryCommentApi`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryCall {
    Create { parent_id: Option<u64>, body: String },
    Edit { id: u64, body: String },
    Delete { id: u64 },
}

/// Accepts every request and answers as the given user. Edits are normalized
/// by trimming surrounding whitespace, as the live service does.
#[derive(Debug)]
pub struct MemoryCommentApi {
    user_id: u64,
    name: String,
    state: Mutex<MemoryState>,
}

impl MemoryCommentApi {
    pub fn new(user_id: u64, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            state: Mutex::new(MemoryState {
                next_id: 1_000_000,
                fail_next: None,
                calls: Vec::new(),
            }),
        }
    }

    /// Make the next call fail with `error`.
    pub async fn fail_next(&self, error: ApiError) {
        self.state.lock().await.fail_next = Some(error);
    }

    pub async fn calls(&self) -> Vec<MemoryCall> {
        self.state.lock().await.calls.clone()
    }

    fn record(&self, id: u64, body: String) -> CommentRecord {
        CommentRecord {
            id: Some(id),
            user_id: Some(self.user_id),
            name: Some(self.name.clone()),
            date: Some(Utc::now()),
            body: Some(body),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CommentApi for MemoryCommentApi {
    async fn create_comment(
        &self,
        parent_id: Option<u64>,
        body: &str,
    ) -> Result<CommentRecord, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(MemoryCall::Create {
            parent_id,
            body: body.to_string(),
        });
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        let id = state.next_id;
        state.next_id += 1;
        Ok(self.record(id, body.to_string()))
    }

    async fn edit_comment(&self, id: u64, body: &str) -> Result<CommentRecord, ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(MemoryCall::Edit {
            id,
            body: body.to_string(),
        });
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        let mut record = self.record(id, body.trim().to_string());
        record.edited_at = Some(Utc::now());
        Ok(record)
    }

    async fn delete_comment(&self, id: u64) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.calls.push(MemoryCall::Delete { id });
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
