//! Core SheetChat library (upload client, chat client, backend, config).

pub mod backend;
pub mod chat;
pub mod config;
pub mod files;
pub mod logging;
pub mod notice;
pub mod session;
pub mod upload;

pub use backend::{BackendError, BackendErrorKind, HttpBackend, SessionBackend};
pub use chat::{ChatClient, ChatState, Message, Role};
pub use files::{AcceptedTypes, FileCandidate};
pub use notice::{Notice, NoticeKind, NoticeSink};
pub use session::Session;
pub use upload::{UploadClient, UploadState};
