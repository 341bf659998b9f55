use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Comment, CommentId, DomainError, DomainResult};

/// Vehicle registration number; the natural key of a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleNumber(pub String);

impl fmt::Display for VehicleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VehicleNumber {
    fn from(s: String) -> Self {
        VehicleNumber(s)
    }
}

impl From<&str> for VehicleNumber {
    fn from(s: &str) -> Self {
        VehicleNumber(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::InProgress, Status::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }

    /// Badge color as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            Status::Pending => "#f5a623",
            Status::InProgress => "#4f78c5",
            Status::Completed => "#4cd964",
        }
    }

    pub fn next(&self) -> Status {
        match self {
            Status::Pending => Status::InProgress,
            Status::InProgress => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }

    pub fn previous(&self) -> Status {
        match self {
            Status::Pending => Status::Completed,
            Status::InProgress => Status::Pending,
            Status::Completed => Status::InProgress,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "pending" => Ok(Status::Pending),
            "inprogress" => Ok(Status::InProgress),
            "completed" | "complete" | "done" => Ok(Status::Completed),
            _ => Err(DomainError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub number: VehicleNumber,
    pub model: String,
    pub complaint: String,
    pub status: Status,
    #[serde(default)]
    pub technician_comment: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Complaint {
    pub fn new(
        number: VehicleNumber,
        model: impl Into<String>,
        complaint: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            number,
            model: model.into(),
            complaint: complaint.into(),
            status: Status::Pending,
            technician_comment: String::new(),
            created: now,
            updated: now,
            comments: Vec::new(),
        }
    }

    /// Business rule: any status may follow any other, and every change
    /// moves `updated` forward even when the status is unchanged.
    pub fn set_status(
        &mut self,
        status: Status,
        technician_comment: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        if let Some(note) = technician_comment {
            self.technician_comment = note;
        }
        self.updated = advance_timestamp(self.updated, now);
    }

    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    pub fn edit_comment(&mut self, id: &CommentId, text: impl Into<String>) -> DomainResult<()> {
        let index = self
            .comments
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| self.comment_not_found(id))?;
        self.comments[index].text = text.into();
        Ok(())
    }

    pub fn remove_comment(&mut self, id: &CommentId) -> DomainResult<Comment> {
        let index = self
            .comments
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| self.comment_not_found(id))?;
        Ok(self.comments.remove(index))
    }

    /// Creation date as shown in the list, e.g. "Mar 4, 2025"
    pub fn created_display(&self) -> String {
        self.created.format("%b %-d, %Y").to_string()
    }

    fn comment_not_found(&self, id: &CommentId) -> DomainError {
        DomainError::CommentNotFound {
            number: self.number.clone(),
            comment_id: id.clone(),
        }
    }
}

/// Returns `now`, or one microsecond past `previous` when the clock has not moved.
pub fn advance_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Trimmed `value`, or `MissingField` when it is blank.
pub fn require_field<'a>(field: &'static str, value: &'a str) -> DomainResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::MissingField(field));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewComment;
    use chrono::TimeZone;

    fn sample(now: DateTime<Utc>) -> Complaint {
        Complaint::new("KA01AB1234".into(), "Toyota Camry 2022", "Brakes squeal", now)
    }

    fn comment(id: &str, text: &str) -> Comment {
        NewComment::new(text, "Jayan (Technician)", Utc::now()).into_comment(id.into())
    }

    #[test]
    fn new_complaint_starts_pending() {
        let now = Utc::now();
        let complaint = sample(now);

        assert_eq!(complaint.status, Status::Pending);
        assert!(complaint.comments.is_empty());
        assert!(complaint.technician_comment.is_empty());
        assert_eq!(complaint.created, complaint.updated);
    }

    #[test]
    fn set_status_advances_updated_on_a_frozen_clock() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        let mut complaint = sample(now);

        complaint.set_status(Status::Completed, None, now);
        let first = complaint.updated;
        complaint.set_status(Status::Completed, None, now);

        assert!(first > now);
        assert!(complaint.updated > first);
        assert_eq!(complaint.created, now);
    }

    #[test]
    fn set_status_keeps_technician_comment_unless_given() {
        let mut complaint = sample(Utc::now());
        complaint.set_status(Status::InProgress, Some("Pads ordered".into()), Utc::now());
        complaint.set_status(Status::Completed, None, Utc::now());

        assert_eq!(complaint.technician_comment, "Pads ordered");
        assert_eq!(complaint.status, Status::Completed);
    }

    #[test]
    fn edit_comment_changes_only_text() {
        let mut complaint = sample(Utc::now());
        complaint.add_comment(comment("c-1", "first"));
        let before = complaint.comment(&"c-1".into()).cloned().unwrap();

        complaint.edit_comment(&"c-1".into(), "edited").unwrap();
        let after = complaint.comment(&"c-1".into()).unwrap();

        assert_eq!(after.text, "edited");
        assert_eq!(after.author, before.author);
        assert_eq!(after.time, before.time);
    }

    #[test]
    fn edit_missing_comment_reports_not_found() {
        let mut complaint = sample(Utc::now());
        complaint.add_comment(comment("c-1", "first"));

        let err = complaint.edit_comment(&"nope".into(), "edited").unwrap_err();
        assert_eq!(
            err,
            DomainError::CommentNotFound {
                number: "KA01AB1234".into(),
                comment_id: "nope".into(),
            }
        );
        assert_eq!(complaint.comment(&"c-1".into()).unwrap().text, "first");
    }

    #[test]
    fn remove_missing_comment_reports_not_found() {
        let mut complaint = sample(Utc::now());
        complaint.add_comment(comment("c-1", "first"));

        let err = complaint.remove_comment(&"nope".into()).unwrap_err();
        assert_eq!(
            err,
            DomainError::CommentNotFound {
                number: "KA01AB1234".into(),
                comment_id: "nope".into(),
            }
        );
        assert_eq!(complaint.comments.len(), 1);
    }

    #[test]
    fn status_parses_loosely() {
        assert_eq!("pending".parse::<Status>().unwrap(), Status::Pending);
        assert_eq!("In Progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("in-progress".parse::<Status>().unwrap(), Status::InProgress);
        assert_eq!("Completed".parse::<Status>().unwrap(), Status::Completed);
        assert!(matches!(
            "archived".parse::<Status>(),
            Err(DomainError::InvalidStatus(_))
        ));
    }

    #[test]
    fn status_serializes_with_display_names() {
        let json = serde_json::to_string(&Status::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
    }

    #[test]
    fn blank_fields_are_missing() {
        assert_eq!(require_field("model", "  Swift "), Ok("Swift"));
        assert_eq!(
            require_field("model", " \t"),
            Err(DomainError::MissingField("model"))
        );
    }

    #[test]
    fn created_display_uses_short_month() {
        let now = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(sample(now).created_display(), "Mar 4, 2025");
    }
}
