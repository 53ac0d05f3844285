//! Upload client: selection, validation and single-flight submission.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::{BackendResult, SessionBackend, UploadReceipt};
use crate::files::{AcceptedTypes, FileCandidate, Rejection};
use crate::notice::{Notice, NoticeSink};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading,
}

/// Proof that an upload is in flight. Hand it back to
/// [`UploadClient::finish_upload`] exactly once.
#[derive(Debug)]
#[must_use]
pub struct UploadTicket {
    file: FileCandidate,
}

impl UploadTicket {
    pub fn file(&self) -> &FileCandidate {
        &self.file
    }
}

pub struct UploadClient {
    accepted: AcceptedTypes,
    selected: Option<FileCandidate>,
    state: UploadState,
    notices: Arc<dyn NoticeSink>,
}

impl UploadClient {
    pub fn new(accepted: AcceptedTypes, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            accepted,
            selected: None,
            state: UploadState::Idle,
            notices,
        }
    }

    pub fn selected(&self) -> Option<&FileCandidate> {
        self.selected.as_ref()
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == UploadState::Uploading
    }

    /// Validates `candidate` and, if it passes, makes it the selected file.
    ///
    /// Returns whether the file was accepted. Rejections leave the current
    /// selection untouched and are reported through the notice sink.
    pub fn select_file(&mut self, candidate: FileCandidate) -> bool {
        match candidate.validate(self.accepted) {
            Ok(()) => {
                self.notify(&Notice::file_accepted(&candidate.name));
                self.selected = Some(candidate);
                true
            }
            Err(Rejection::InvalidType) => {
                warn!(file = %candidate.name, mime = %candidate.mime_type, "rejected file type");
                self.notify(&Notice::invalid_file_type(self.accepted));
                false
            }
            Err(Rejection::TooLarge) => {
                warn!(file = %candidate.name, size = candidate.size_bytes, "rejected oversized file");
                self.notify(&Notice::file_too_large());
                false
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Enters `Uploading` if a file is selected and nothing is in flight.
    pub fn begin_upload(&mut self) -> Option<UploadTicket> {
        if self.is_busy() {
            return None;
        }
        let file = self.selected.clone()?;
        self.state = UploadState::Uploading;
        Some(UploadTicket { file })
    }

    /// Settles an in-flight upload and returns to `Idle`.
    ///
    /// On failure the selection is kept so the user can resubmit.
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: BackendResult<UploadReceipt>,
    ) -> Option<Session> {
        self.state = UploadState::Idle;
        match result {
            Ok(receipt) => {
                info!(file = %ticket.file.name, room_id = %receipt.room_id, "upload complete");
                self.notify(&Notice::upload_succeeded());
                Some(Session::new(ticket.file.name, receipt.room_id))
            }
            Err(err) => {
                warn!(file = %ticket.file.name, kind = %err.kind, error = %err, "upload failed");
                self.notify(&Notice::upload_failed(&err.message));
                None
            }
        }
    }

    /// Uploads the selected file. No-op without a selection or while busy.
    pub async fn submit_selected_file<B: SessionBackend>(&mut self, backend: &B) -> Option<Session> {
        let ticket = self.begin_upload()?;
        let result = backend.upload(ticket.file()).await;
        self.finish_upload(ticket, result)
    }

    fn notify(&self, notice: &Notice) {
        self.notices.notify(notice);
    }
}
