//! User options applied to the comment tree.
//!
//! An option is a named value plus a set of hooks. The pipeline owns the
//! registered options and their current values, applies every comment
//! processor to every node after the tree is built, and re-runs only the
//! changed option's processor when a value changes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::comment_tree::{CommentNode, CommentOrder, CommentTree, NodeId, expanded_at_depth};
use crate::date::{DateStyle, DateText};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// The values an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Integer { min: i64 },
    Text,
    Choice(&'static [&'static str]),
}

impl OptionKind {
    pub fn accepts(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (Self::Bool, OptionValue::Bool(_)) => true,
            (Self::Integer { min }, OptionValue::Integer(n)) => n >= min,
            (Self::Text, OptionValue::Text(_)) => true,
            (Self::Choice(choices), OptionValue::Text(s)) => choices.contains(&s.as_str()),
            _ => false,
        }
    }

    /// Parse a value typed on the command line.
    pub fn parse(&self, raw: &str) -> Option<OptionValue> {
        let value = match self {
            Self::Bool => OptionValue::Bool(raw.parse().ok()?),
            Self::Integer { .. } => OptionValue::Integer(raw.trim().parse().ok()?),
            Self::Text | Self::Choice(_) => OptionValue::Text(raw.to_string()),
        };
        self.accepts(&value).then_some(value)
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Bool => "true|false".into(),
            Self::Integer { min } => format!("integer >= {min}"),
            Self::Text => "text".into(),
            Self::Choice(choices) => choices.join("|"),
        }
    }
}

/// Static description of an option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub key: &'static str,
    pub default: OptionValue,
    pub kind: OptionKind,
    pub description_short: &'static str,
    pub description_long: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("invalid option {key:?}: {reason}")]
    InvalidRegistration { key: String, reason: &'static str },
    #[error("unknown option {0:?}")]
    UnknownOption(String),
    #[error("option {key:?} expects {expected}, got {value}")]
    TypeMismatch {
        key: String,
        expected: String,
        value: String,
    },
}

/// Hooks of one option. Every hook defaults to doing nothing.
pub trait CommentOption: Send {
    fn spec(&self) -> OptionSpec;

    /// Called once with the loaded value, before the tree exists.
    fn on_start(&mut self, _value: &OptionValue) {}

    /// Called after the value changed, before comments are reprocessed.
    fn on_value_change(&mut self, _value: &OptionValue) {}

    /// Called once after the tree has been built and processed.
    fn on_load(&self, _value: &OptionValue, _tree: &mut CommentTree) {}

    /// Whether [`CommentOption::process_comment`] does anything.
    fn processes_comments(&self) -> bool {
        false
    }

    fn process_comment(&self, _value: &OptionValue, _node: &mut CommentNode) {}

    /// Whether the processor runs again on a comment after it is edited.
    fn refreshes_on_edit(&self) -> bool {
        false
    }
}

fn validate(spec: &OptionSpec) -> Result<(), &'static str> {
    if spec.key.is_empty() {
        return Err("key must not be empty");
    }
    if spec.description_short.is_empty() {
        return Err("short description must not be empty");
    }
    if !spec.kind.accepts(&spec.default) {
        return Err("default value does not match the option kind");
    }
    Ok(())
}

#[derive(Default)]
pub struct OptionsPipeline {
    options: Vec<Box<dyn CommentOption>>,
    values: BTreeMap<String, OptionValue>,
}

impl fmt::Debug for OptionsPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsPipeline")
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl OptionsPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline with every built-in option registered.
    pub fn with_builtin() -> Self {
        let mut pipeline = Self::new();
        for option in builtin_options() {
            // Built-in specs are valid; a failure is already logged.
            let _ = pipeline.register(option);
        }
        pipeline
    }

    /// Add an option. An invalid option is logged and left out.
    pub fn register(&mut self, option: Box<dyn CommentOption>) -> Result<(), OptionError> {
        let spec = option.spec();
        let invalid = |reason| OptionError::InvalidRegistration {
            key: spec.key.to_string(),
            reason,
        };
        let result = validate(&spec).map_err(invalid).and_then(|()| {
            if self.values.contains_key(spec.key) {
                Err(invalid("key is already registered"))
            } else {
                Ok(())
            }
        });
        if let Err(err) = result {
            warn!(error = %err, "rejected option");
            return Err(err);
        }
        debug!(key = spec.key, "registered option");
        self.values.insert(spec.key.to_string(), spec.default);
        self.options.push(option);
        Ok(())
    }

    fn position(&self, key: &str) -> Result<usize, OptionError> {
        self.options
            .iter()
            .position(|option| option.spec().key == key)
            .ok_or_else(|| OptionError::UnknownOption(key.to_string()))
    }

    /// Take over stored values. Values for unknown options or of the wrong
    /// kind are dropped.
    pub fn load_values(&mut self, stored: &BTreeMap<String, OptionValue>) {
        for (key, value) in stored {
            match self.check(key, value) {
                Ok(()) => {
                    self.values.insert(key.clone(), value.clone());
                }
                Err(err) => warn!(error = %err, "ignoring stored option value"),
            }
        }
    }

    fn check(&self, key: &str, value: &OptionValue) -> Result<(), OptionError> {
        let spec = self.options[self.position(key)?].spec();
        if spec.kind.accepts(value) {
            Ok(())
        } else {
            Err(OptionError::TypeMismatch {
                key: key.to_string(),
                expected: spec.kind.describe(),
                value: value.to_string(),
            })
        }
    }

    /// Run every `on_start` hook with the current values.
    pub fn start(&mut self) {
        for option in &mut self.options {
            if let Some(value) = self.values.get(option.spec().key) {
                option.on_start(value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &BTreeMap<String, OptionValue> {
        &self.values
    }

    pub fn specs(&self) -> impl Iterator<Item = OptionSpec> + '_ {
        self.options.iter().map(|option| option.spec())
    }

    pub fn spec(&self, key: &str) -> Option<OptionSpec> {
        self.specs().find(|spec| spec.key == key)
    }

    /// Change a value and re-run that option's processor over the whole
    /// tree. Returns `false` when the value was already current.
    pub fn set(
        &mut self,
        key: &str,
        value: OptionValue,
        tree: &mut CommentTree,
    ) -> Result<bool, OptionError> {
        self.check(key, &value)?;
        if self.values.get(key) == Some(&value) {
            return Ok(false);
        }
        info!(key, %value, "option changed");
        self.values.insert(key.to_string(), value.clone());
        let index = self.position(key)?;
        let option = &mut self.options[index];
        option.on_value_change(&value);
        if option.processes_comments() {
            let ids: Vec<NodeId> = tree.iter().collect();
            for id in ids {
                if let Some(node) = tree.get_mut(id) {
                    option.process_comment(&value, node);
                }
            }
        }
        Ok(true)
    }

    /// Apply every processor to one node.
    pub fn process_node(&self, tree: &mut CommentTree, id: NodeId) {
        let Some(node) = tree.get_mut(id) else {
            return;
        };
        for option in self.options.iter().filter(|o| o.processes_comments()) {
            if let Some(value) = self.values.get(option.spec().key) {
                option.process_comment(value, node);
            }
        }
    }

    /// Re-run the processors that depend on edited content on one node.
    pub fn refresh_edited(&self, tree: &mut CommentTree, id: NodeId) {
        let Some(node) = tree.get_mut(id) else {
            return;
        };
        for option in self
            .options
            .iter()
            .filter(|o| o.processes_comments() && o.refreshes_on_edit())
        {
            if let Some(value) = self.values.get(option.spec().key) {
                option.process_comment(value, node);
            }
        }
    }

    /// Apply every processor to every node.
    pub fn process_all(&self, tree: &mut CommentTree) {
        let ids: Vec<NodeId> = tree.iter().collect();
        for id in ids {
            self.process_node(tree, id);
        }
    }

    /// Run every `on_load` hook.
    pub fn run_on_load(&self, tree: &mut CommentTree) {
        for option in &self.options {
            if let Some(value) = self.values.get(option.spec().key) {
                option.on_load(value, tree);
            }
        }
    }
}

pub fn builtin_options() -> Vec<Box<dyn CommentOption>> {
    vec![
        Box::new(CollapseDepthOption),
        Box::new(HideUsersOption::default()),
        Box::new(DefaultSortOption),
        Box::new(DateFormatOption::default()),
    ]
}

/// Collapses every node whose depth is a positive multiple of the value.
#[derive(Debug, Default)]
pub struct CollapseDepthOption;

impl CommentOption for CollapseDepthOption {
    fn spec(&self) -> OptionSpec {
        OptionSpec {
            key: "collapseDepth",
            default: OptionValue::Integer(0),
            kind: OptionKind::Integer { min: 0 },
            description_short: "Collapse replies at this depth",
            description_long: "Comments nested at a multiple of this depth start out \
                collapsed. 0 keeps every thread expanded; 3 is a good choice for long threads.",
        }
    }

    fn processes_comments(&self) -> bool {
        true
    }

    fn process_comment(&self, value: &OptionValue, node: &mut CommentNode) {
        let depth = value
            .as_integer()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        node.expanded = expanded_at_depth(node.depth(), depth);
    }
}

/// Hides comments by the listed authors.
#[derive(Debug, Default)]
pub struct HideUsersOption {
    hidden: HashSet<String>,
}

impl HideUsersOption {
    fn cache(&mut self, value: &OptionValue) {
        self.hidden = value
            .as_text()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
    }
}

impl CommentOption for HideUsersOption {
    fn spec(&self) -> OptionSpec {
        OptionSpec {
            key: "hideUsers",
            default: OptionValue::Text(String::new()),
            kind: OptionKind::Text,
            description_short: "Hide comments by these users",
            description_long: "Comma-separated list of display names. Their comments \
                and all replies to them are replaced by a one-line placeholder.",
        }
    }

    fn on_start(&mut self, value: &OptionValue) {
        self.cache(value);
    }

    fn on_value_change(&mut self, value: &OptionValue) {
        self.cache(value);
    }

    fn processes_comments(&self) -> bool {
        true
    }

    fn process_comment(&self, _value: &OptionValue, node: &mut CommentNode) {
        node.hidden = node
            .author
            .as_ref()
            .is_some_and(|name| self.hidden.contains(name));
    }
}

/// Forces the initial comment order.
#[derive(Debug, Default)]
pub struct DefaultSortOption;

impl CommentOption for DefaultSortOption {
    fn spec(&self) -> OptionSpec {
        OptionSpec {
            key: "defaultSort",
            default: OptionValue::Text("auto".into()),
            kind: OptionKind::Choice(&["auto", "chrono", "new"]),
            description_short: "Initial comment order",
            description_long: "auto keeps the order the comments were loaded in, chrono \
                shows oldest first, new shows newest first.",
        }
    }

    fn on_load(&self, value: &OptionValue, tree: &mut CommentTree) {
        match value.as_text() {
            Some("chrono") => tree.set_order(CommentOrder::Chronological),
            Some("new") => tree.set_order(CommentOrder::ReverseChronological),
            _ => {}
        }
    }
}

/// Fills in the header date texts of each node.
pub struct DateFormatOption {
    clock: fn() -> DateTime<Utc>,
}

impl DateFormatOption {
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }
}

impl Default for DateFormatOption {
    fn default() -> Self {
        Self::with_clock(Utc::now)
    }
}

impl CommentOption for DateFormatOption {
    fn spec(&self) -> OptionSpec {
        OptionSpec {
            key: "dateFormat",
            default: OptionValue::Text("relative".into()),
            kind: OptionKind::Choice(&["relative", "absolute"]),
            description_short: "Comment date style",
            description_long: "relative shows comments from the last day as \"5 mins ago\" \
                or \"3 hrs ago\"; absolute always shows the month and day.",
        }
    }

    fn processes_comments(&self) -> bool {
        true
    }

    fn process_comment(&self, value: &OptionValue, node: &mut CommentNode) {
        let style = value
            .as_text()
            .and_then(DateStyle::from_key)
            .unwrap_or_default();
        let now = (self.clock)();
        node.date_text = node.created_at.map(|d| DateText::new(d, style, now));
        node.edited_text = node.edited_at.map(|d| DateText::new(d, style, now));
    }

    fn refreshes_on_edit(&self) -> bool {
        true
    }
}
