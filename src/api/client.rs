use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::ACCEPT;
use serde_json::{Value, json};
use tracing::debug;

use super::ApiError;
use super::types::CommentRecord;

pub const DEFAULT_BASE_URL: &str = "https://www.astralcodexten.com";

/// Remote service that creates, edits and deletes comments.
///
/// A rejected call must not have changed anything on the server side as far
/// as the caller is concerned; callers leave their state untouched on `Err`.
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// Create a comment. `parent_id` of `None` creates a top-level comment.
    async fn create_comment(
        &self,
        parent_id: Option<u64>,
        body: &str,
    ) -> Result<CommentRecord, ApiError>;

    /// Replace the body of a comment. The returned body may differ from the
    /// requested one.
    async fn edit_comment(&self, id: u64, body: &str) -> Result<CommentRecord, ApiError>;

    async fn delete_comment(&self, id: u64) -> Result<(), ApiError>;
}

/// Placeholder used when no service is configured. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnimplementedCommentApi;

#[async_trait]
impl CommentApi for UnimplementedCommentApi {
    async fn create_comment(
        &self,
        _parent_id: Option<u64>,
        _body: &str,
    ) -> Result<CommentRecord, ApiError> {
        Err(ApiError::Unsupported("createComment"))
    }

    async fn edit_comment(&self, _id: u64, _body: &str) -> Result<CommentRecord, ApiError> {
        Err(ApiError::Unsupported("editComment"))
    }

    async fn delete_comment(&self, _id: u64) -> Result<(), ApiError> {
        Err(ApiError::Unsupported("deleteComment"))
    }
}

/// Client for the live Substack comment endpoints of one post.
#[derive(Clone)]
pub struct SubstackClient {
    http: reqwest::Client,
    base_url: String,
    post_id: u64,
}

impl SubstackClient {
    pub fn new(base_url: impl Into<String>, post_id: u64) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            post_id,
        })
    }

    async fn execute_rpc(
        &self,
        method: Method,
        path: &str,
        request: Value,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "sending comment request");
        let response = self
            .http
            .request(method, &url)
            .header(ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(
                status.as_u16(),
                status.canonical_reason().unwrap_or("").into(),
            ));
        }

        let body: Value = response.json().await?;
        if !body.is_object() {
            return Err(ApiError::Parse("response is not an object".into()));
        }
        Ok(body)
    }
}

fn into_record(value: Value) -> Result<CommentRecord, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait]
impl CommentApi for SubstackClient {
    async fn create_comment(
        &self,
        parent_id: Option<u64>,
        body: &str,
    ) -> Result<CommentRecord, ApiError> {
        let mut request = json!({ "body": body });
        if let Some(parent_id) = parent_id {
            request["parent_id"] = json!(parent_id);
        }
        let path = format!("/api/v1/post/{}/comment", self.post_id);
        into_record(self.execute_rpc(Method::POST, &path, request).await?)
    }

    async fn edit_comment(&self, id: u64, body: &str) -> Result<CommentRecord, ApiError> {
        let path = format!("/api/v1/comment/{id}");
        let mut response = self
            .execute_rpc(Method::PATCH, &path, json!({ "body": body }))
            .await?;
        match response.get_mut("edited").map(Value::take) {
            Some(edited @ Value::Object(_)) => into_record(edited),
            _ => Err(ApiError::Parse("response.edited is not an object".into())),
        }
    }

    async fn delete_comment(&self, id: u64) -> Result<(), ApiError> {
        let path = format!("/api/v1/comment/{id}");
        self.execute_rpc(Method::DELETE, &path, json!({})).await?;
        Ok(())
    }
}
