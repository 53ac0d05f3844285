use std::fmt;

/// An uploaded file paired with the room id the backend issued for it.
///
/// Lives in memory only; nothing is persisted across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub file_display_name: String,
    pub session_id: String,
}

impl Session {
    pub fn new(file_display_name: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            file_display_name: file_display_name.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (session {})", self.file_display_name, self.session_id)
    }
}
