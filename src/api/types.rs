use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::ApiError;

/// One comment as delivered by the comments endpoint, with its replies nested
/// under `children`.
///
/// Every field is parsed leniently: a value of the wrong type is treated as
/// absent instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub user_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub deleted: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "lenient_children")]
    pub children: Vec<CommentRecord>,
}

/// The comments endpoint wraps the top-level array in an object.
#[derive(Debug, Deserialize)]
struct CommentsResponse {
    #[serde(default, deserialize_with = "lenient_children")]
    comments: Vec<CommentRecord>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient(deserializer)?.unwrap_or(false))
}

fn lenient_children<'de, D>(deserializer: D) -> Result<Vec<CommentRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(values) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(values
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

/// Parse a comments document: either a bare array of records or an object
/// holding them under `comments`.
pub fn parse_comments(json: &str) -> Result<Vec<CommentRecord>, ApiError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ApiError::Parse(e.to_string()))?;
    match value {
        Value::Array(_) => {
            let wrapped = serde_json::json!({ "comments": value });
            let response: CommentsResponse =
                serde_json::from_value(wrapped).map_err(|e| ApiError::Parse(e.to_string()))?;
            Ok(response.comments)
        }
        Value::Object(_) => {
            let response: CommentsResponse =
                serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))?;
            Ok(response.comments)
        }
        _ => Err(ApiError::Parse(
            "expected an array of comments or an object with a comments array".into(),
        )),
    }
}

/// Total number of comments, replies included.
pub fn count_comments(records: &[CommentRecord]) -> usize {
    records
        .iter()
        .map(|record| 1 + count_comments(&record.children))
        .sum()
}

/// Order in which the host page delivered the comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    #[default]
    OldestFirst,
    MostRecentFirst,
}

impl CommentSort {
    /// Interpret the host's `sort` parameter. Unknown values fall back to
    /// oldest-first.
    pub fn from_param(param: &str) -> Self {
        match param {
            "oldest_first" => Self::OldestFirst,
            "most_recent_first" => Self::MostRecentFirst,
            other => {
                tracing::info!(sort = other, "unknown comment sort, using oldest_first");
                Self::OldestFirst
            }
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Self::OldestFirst => "oldest_first",
            Self::MostRecentFirst => "most_recent_first",
        }
    }
}
