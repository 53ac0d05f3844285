//! Terminal rendering for notices and transcript entries.
//!
//! Notices go to stderr; transcript entries go to stdout.

use sheetchat_core::chat::Transcript;
use sheetchat_core::notice::Severity;
use sheetchat_core::{Message, Notice, NoticeSink, Role, Session};

/// Prints notices on stderr as they arrive.
#[derive(Debug, Default)]
pub struct StderrNotices;

impl NoticeSink for StderrNotices {
    fn notify(&self, notice: &Notice) {
        let marker = match notice.severity() {
            Severity::Success => "✓",
            Severity::Error => "✗",
        };
        eprintln!("{marker} {notice}");
    }
}

pub fn print_session_header(session: &Session) {
    println!("Chat with Your Data");
    println!("File: {}", session.file_display_name);
    println!("Session: {}", session.session_id);
    println!();
}

pub fn print_message(message: &Message) {
    let label = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    println!("{label}: {}", message.content);
}

/// Prints every message from `from` onward and returns the new render cursor.
pub fn print_since(transcript: &Transcript, from: usize) -> usize {
    for message in transcript.since(from) {
        print_message(message);
    }
    transcript.len().max(from)
}
