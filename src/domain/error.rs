use thiserror::Error;

use super::{CommentId, VehicleNumber};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Complaint not found: {0}")]
    ComplaintNotFound(VehicleNumber),

    #[error("Comment {comment_id} not found on complaint {number}")]
    CommentNotFound {
        number: VehicleNumber,
        comment_id: CommentId,
    },

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Required field missing: {0}")]
    MissingField(&'static str),
}

pub type DomainResult<T> = Result<T, DomainError>;
