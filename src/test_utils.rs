//! Test data builders.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::api::{CommentRecord, MemoryCommentApi};
use crate::app::App;
use crate::comment_tree::CommentOrder;
use crate::options::{OptionValue, OptionsPipeline};
use crate::session::CommentSession;

/// Fixed timestamp for deterministic tests: 2024-03-01 12:00:00 UTC.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub struct RecordBuilder {
    record: CommentRecord,
}

impl RecordBuilder {
    /// A record for user `1000 + id`, posted `id` minutes before [`test_now`].
    pub fn new(id: u64) -> Self {
        Self {
            record: CommentRecord {
                id: Some(id),
                user_id: Some(1000 + id),
                name: Some(format!("Commenter {id}")),
                date: Some(test_now() - TimeDelta::minutes(id as i64)),
                edited_at: None,
                deleted: false,
                body: Some(format!("Comment {id}")),
                children: Vec::new(),
            },
        }
    }

    pub fn no_id(mut self) -> Self {
        self.record.id = None;
        self
    }

    pub fn user(mut self, user_id: u64, name: &str) -> Self {
        self.record.user_id = Some(user_id);
        self.record.name = Some(name.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.record.name = Some(name.to_string());
        self
    }

    pub fn no_name(mut self) -> Self {
        self.record.name = None;
        self.record.user_id = None;
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.record.body = Some(body.to_string());
        self
    }

    pub fn no_body(mut self) -> Self {
        self.record.body = None;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.record.deleted = true;
        self
    }

    pub fn edited(mut self) -> Self {
        self.record.edited_at = Some(test_now());
        self
    }

    pub fn child(mut self, child: CommentRecord) -> Self {
        self.record.children.push(child);
        self
    }

    pub fn build(self) -> CommentRecord {
        self.record
    }
}

/// Two threads:
///
/// ```text
/// 1
/// ├── 2
/// │   └── 4
/// └── 3
/// 5
/// └── 6
/// ```
pub fn sample_records() -> Vec<CommentRecord> {
    vec![
        RecordBuilder::new(1)
            .body("Has anyone read http://example.com/paper yet?")
            .child(
                RecordBuilder::new(2)
                    .child(RecordBuilder::new(4).build())
                    .build(),
            )
            .child(RecordBuilder::new(3).build())
            .build(),
        RecordBuilder::new(5)
            .child(RecordBuilder::new(6).build())
            .build(),
    ]
}

/// A single thread of `n` nested replies, ids `1..=n` from the top.
pub fn chain(n: u64) -> Vec<CommentRecord> {
    let mut record: Option<CommentRecord> = None;
    for id in (1..=n).rev() {
        let mut builder = RecordBuilder::new(id);
        if let Some(child) = record.take() {
            builder = builder.child(child);
        }
        record = Some(builder.build());
    }
    record.into_iter().collect()
}

/// The id [`TestAppBuilder`] logs in as. It owns comment 3 of [`sample_records`].
pub const TEST_VIEWER: u64 = 1003;

/// Builds an [`App`] over [`sample_records`] backed by a [`MemoryCommentApi`].
pub struct TestAppBuilder {
    records: Vec<CommentRecord>,
    order: CommentOrder,
    viewer: Option<u64>,
    options: Vec<(&'static str, OptionValue)>,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            records: sample_records(),
            order: CommentOrder::Chronological,
            viewer: Some(TEST_VIEWER),
            options: Vec::new(),
        }
    }

    pub fn records(mut self, records: Vec<CommentRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn order(mut self, order: CommentOrder) -> Self {
        self.order = order;
        self
    }

    pub fn logged_out(mut self) -> Self {
        self.viewer = None;
        self
    }

    pub fn option(mut self, key: &'static str, value: OptionValue) -> Self {
        self.options.push((key, value));
        self
    }

    pub fn build(self) -> App {
        self.build_with_api().0
    }

    pub fn build_with_api(self) -> (App, Arc<MemoryCommentApi>) {
        let api = Arc::new(MemoryCommentApi::new(TEST_VIEWER, "Commenter 3"));
        let mut options = OptionsPipeline::with_builtin();
        options.load_values(
            &self
                .options
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect::<BTreeMap<_, _>>(),
        );
        let session =
            CommentSession::new(&self.records, self.order, options, api.clone(), self.viewer);
        (App::new(session, "Test thread"), api)
    }
}
