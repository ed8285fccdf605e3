mod client;
mod error;
mod memory;
mod types;

pub use client::{CommentApi, DEFAULT_BASE_URL, SubstackClient, UnimplementedCommentApi};
pub use error::ApiError;
pub use memory::{MemoryCall, MemoryCommentApi};
pub use types::{CommentRecord, CommentSort, count_comments, parse_comments};
