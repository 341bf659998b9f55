use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};

use super::{AppError, AppResult};
use crate::domain::*;
use crate::ports::{KeyValueStorage, StorageError};

/// Key under which the whole collection is stored.
pub const STORAGE_KEY: &str = "vehicle-storage";
const STORAGE_VERSION: u32 = 0;

/// Immutable view of the collection at one point in time.
pub type Snapshot = Arc<Vec<Complaint>>;

type FlushRequest = oneshot::Sender<AppResult<()>>;

#[derive(Serialize)]
struct PersistedStateRef<'a> {
    vehicles: &'a [Complaint],
}

#[derive(Serialize)]
struct PersistedBlobRef<'a> {
    state: PersistedStateRef<'a>,
    version: u32,
}

#[derive(Deserialize)]
struct PersistedState {
    #[serde(default)]
    vehicles: Vec<Complaint>,
}

#[derive(Deserialize)]
struct PersistedBlob {
    state: PersistedState,
    #[serde(default)]
    #[allow(dead_code)]
    version: u32,
}

pub fn encode_snapshot(complaints: &[Complaint]) -> AppResult<String> {
    let blob = PersistedBlobRef {
        state: PersistedStateRef {
            vehicles: complaints,
        },
        version: STORAGE_VERSION,
    };
    serde_json::to_string(&blob)
        .map_err(|e| AppError::Storage(StorageError::Serialization(e.to_string())))
}

pub fn decode_snapshot(blob: &str) -> AppResult<Vec<Complaint>> {
    let blob: PersistedBlob =
        serde_json::from_str(blob).map_err(|e| AppError::CorruptState(e.to_string()))?;
    Ok(blob.state.vehicles)
}

/// Single source of truth for complaint records.
///
/// Mutations apply synchronously to the in-memory collection and publish a
/// new [`Snapshot`] to subscribers. A background task writes every published
/// snapshot to storage; callers never wait for it unless they call
/// [`ComplaintStore::flush`].
pub struct ComplaintStore {
    state: watch::Sender<Snapshot>,
    flush_requests: mpsc::UnboundedSender<FlushRequest>,
}

impl ComplaintStore {
    /// Loads the stored collection and starts the persister task.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn open(storage: Arc<dyn KeyValueStorage>) -> AppResult<Self> {
        let complaints = match storage.get_item(STORAGE_KEY).await? {
            Some(blob) => decode_snapshot(&blob)?,
            None => Vec::new(),
        };
        tracing::info!("Loaded {} complaints from storage", complaints.len());

        let (state, updates) = watch::channel(Arc::new(complaints));
        let (flush_requests, flush_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_persister(storage, updates, flush_rx));

        Ok(Self {
            state,
            flush_requests,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// First complaint registered under `number`
    pub fn complaint(&self, number: &VehicleNumber) -> Option<Complaint> {
        self.state
            .borrow()
            .iter()
            .find(|c| &c.number == number)
            .cloned()
    }

    /// Receiver notified after every mutation that changed the collection.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub fn add_complaint(
        &self,
        number: VehicleNumber,
        model: impl Into<String>,
        complaint: impl Into<String>,
    ) -> Complaint {
        let record = Complaint::new(number, model, complaint, Utc::now());

        self.state.send_modify(|complaints| {
            if complaints.iter().any(|c| c.number == record.number) {
                tracing::warn!(
                    "Complaint {} already exists, storing a duplicate record",
                    record.number
                );
            }
            Arc::make_mut(complaints).push(record.clone());
        });

        tracing::debug!("Added complaint {}", record.number);
        record
    }

    pub fn update_status(
        &self,
        number: &VehicleNumber,
        status: Status,
        technician_comment: Option<String>,
    ) -> AppResult<Complaint> {
        let now = Utc::now();
        let updated = self.mutate(number, |complaint| {
            complaint.set_status(status, technician_comment.clone(), now);
            Ok(complaint.clone())
        })?;

        tracing::debug!("Complaint {} is now {}", number, status);
        Ok(updated)
    }

    /// Removes every record registered under `number` and returns the first.
    pub fn delete_complaint(&self, number: &VehicleNumber) -> AppResult<Complaint> {
        let mut removed = None;

        self.state.send_if_modified(|complaints| {
            let Some(first) = complaints.iter().find(|c| &c.number == number).cloned() else {
                return false;
            };
            Arc::make_mut(complaints).retain(|c| &c.number != number);
            removed = Some(first);
            true
        });

        let removed = removed.ok_or_else(|| DomainError::ComplaintNotFound(number.clone()))?;
        tracing::debug!("Deleted complaint {}", number);
        Ok(removed)
    }

    pub fn add_comment(&self, number: &VehicleNumber, comment: NewComment) -> AppResult<CommentId> {
        let id = CommentId::generate();
        self.mutate(number, |complaint| {
            complaint.add_comment(comment.clone().into_comment(id.clone()));
            Ok(())
        })?;

        tracing::debug!("Added comment {} to {}", id, number);
        Ok(id)
    }

    pub fn edit_comment(
        &self,
        number: &VehicleNumber,
        comment_id: &CommentId,
        text: impl Into<String>,
    ) -> AppResult<()> {
        let text = text.into();
        self.mutate(number, |complaint| complaint.edit_comment(comment_id, text.clone()))?;

        tracing::debug!("Edited comment {} on {}", comment_id, number);
        Ok(())
    }

    pub fn delete_comment(
        &self,
        number: &VehicleNumber,
        comment_id: &CommentId,
    ) -> AppResult<Comment> {
        let removed = self.mutate(number, |complaint| complaint.remove_comment(comment_id))?;

        tracing::debug!("Deleted comment {} from {}", comment_id, number);
        Ok(removed)
    }

    /// Writes the current snapshot and waits for the write to finish.
    pub async fn flush(&self) -> AppResult<()> {
        let (ack, done) = oneshot::channel();
        self.flush_requests
            .send(ack)
            .map_err(|_| AppError::PersisterStopped)?;
        done.await.map_err(|_| AppError::PersisterStopped)?
    }

    /// Applies `apply` to copies of every record under `number`, then swaps
    /// the copies in. A record missing the targeted comment is left as it is;
    /// any other failure publishes nothing.
    fn mutate<T>(
        &self,
        number: &VehicleNumber,
        mut apply: impl FnMut(&mut Complaint) -> DomainResult<T>,
    ) -> AppResult<T> {
        let mut outcome: AppResult<T> = Err(DomainError::ComplaintNotFound(number.clone()).into());

        self.state.send_if_modified(|complaints| {
            let mut replacements = Vec::new();
            let mut first_value = None;
            let mut missing_comment = None;

            for (index, complaint) in complaints.iter().enumerate() {
                if &complaint.number != number {
                    continue;
                }
                let mut next = complaint.clone();
                match apply(&mut next) {
                    Ok(value) => {
                        first_value.get_or_insert(value);
                        replacements.push((index, next));
                    }
                    Err(e @ DomainError::CommentNotFound { .. }) => {
                        missing_comment.get_or_insert(e);
                    }
                    Err(e) => {
                        outcome = Err(e.into());
                        return false;
                    }
                }
            }

            let Some(value) = first_value else {
                if let Some(e) = missing_comment {
                    outcome = Err(e.into());
                }
                return false;
            };

            let list = Arc::make_mut(complaints);
            for (index, next) in replacements {
                list[index] = next;
            }
            outcome = Ok(value);
            true
        });

        outcome
    }
}

async fn persist(storage: &dyn KeyValueStorage, snapshot: &[Complaint]) -> AppResult<()> {
    let blob = encode_snapshot(snapshot)?;
    storage.set_item(STORAGE_KEY, &blob).await?;
    Ok(())
}

async fn run_persister(
    storage: Arc<dyn KeyValueStorage>,
    mut updates: watch::Receiver<Snapshot>,
    mut flush_requests: mpsc::UnboundedReceiver<FlushRequest>,
) {
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Err(e) = persist(storage.as_ref(), &snapshot).await {
                    tracing::warn!("Failed to persist complaints: {}", e);
                }
            }
            request = flush_requests.recv() => {
                let Some(ack) = request else {
                    break;
                };
                let snapshot = updates.borrow_and_update().clone();
                let _ = ack.send(persist(storage.as_ref(), &snapshot).await);
            }
        }
    }

    tracing::debug!("Complaint persister stopped");
}
