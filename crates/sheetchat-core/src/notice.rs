//! Transient user-facing notices (the toast channel).
//!
//! Validation and upload outcomes are reported here. Chat failures never
//! are: they land inline in the transcript.

use std::fmt;
use std::sync::Mutex;

use crate::files::AcceptedTypes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    FileAccepted,
    InvalidFileType,
    FileTooLarge,
    UploadSucceeded,
    UploadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn file_accepted(name: &str) -> Self {
        Self {
            kind: NoticeKind::FileAccepted,
            message: format!("File \"{name}\" selected successfully"),
        }
    }

    pub fn invalid_file_type(accepted: AcceptedTypes) -> Self {
        Self {
            kind: NoticeKind::InvalidFileType,
            message: format!(
                "Invalid file type. Please upload a spreadsheet ({})",
                accepted.extension_hint()
            ),
        }
    }

    pub fn file_too_large() -> Self {
        Self {
            kind: NoticeKind::FileTooLarge,
            message: "File too large. Maximum size is 10MB".to_string(),
        }
    }

    pub fn upload_succeeded() -> Self {
        Self {
            kind: NoticeKind::UploadSucceeded,
            message: "Starting chat with your data...".to_string(),
        }
    }

    pub fn upload_failed(reason: &str) -> Self {
        Self {
            kind: NoticeKind::UploadFailed,
            message: format!("Upload failed: {reason}"),
        }
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            NoticeKind::FileAccepted | NoticeKind::UploadSucceeded => Severity::Success,
            NoticeKind::InvalidFileType | NoticeKind::FileTooLarge | NoticeKind::UploadFailed => {
                Severity::Error
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Receiver for notices surfaced by the upload client.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Sink that keeps every notice in arrival order.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything received so far.
    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.snapshot().iter().map(|n| n.kind).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.snapshot().pop()
    }
}

impl NoticeSink for NoticeLog {
    fn notify(&self, notice: &Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice.clone());
        }
    }
}
