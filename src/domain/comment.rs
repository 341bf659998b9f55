use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub String);

impl CommentId {
    /// Random 128-bit id; two comments created in the same instant still differ.
    pub fn generate() -> Self {
        CommentId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CommentId {
    fn from(s: String) -> Self {
        CommentId(s)
    }
}

impl From<&str> for CommentId {
    fn from(s: &str) -> Self {
        CommentId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: String,
    pub time: DateTime<Utc>,
}

/// A comment as submitted by a screen, before the store assigns its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub text: String,
    pub author: String,
    pub time: DateTime<Utc>,
}

impl NewComment {
    pub fn new(text: impl Into<String>, author: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            time,
        }
    }

    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            text: self.text,
            author: self.author,
            time: self.time,
        }
    }
}

impl Comment {
    /// Format the time since creation for display
    pub fn time_since_created(&self) -> String {
        super::time_ago(self.time, Utc::now())
    }
}
