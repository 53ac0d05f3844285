//! Local file candidates + MIME helpers for spreadsheet uploads.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLS_MIME: &str = "application/vnd.ms-excel";
pub const CSV_MIME: &str = "text/csv";
const CSV_ALT_MIME: &str = "application/csv";

/// Upper bound on an uploadable file (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const SPREADSHEET_MIMES: &[&str] = &[XLSX_MIME, XLS_MIME];
const SPREADSHEET_OR_CSV_MIMES: &[&str] = &[XLSX_MIME, XLS_MIME, CSV_MIME, CSV_ALT_MIME];

/// Bytes read from the head of a file when the extension gives no hint.
const SNIFF_LEN: u64 = 8192;

/// MIME allow-list applied before a file may be transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptedTypes {
    /// `.xlsx` and `.xls` only.
    Spreadsheet,
    /// `.xlsx`, `.xls` and `.csv`.
    #[default]
    SpreadsheetOrCsv,
}

impl AcceptedTypes {
    pub fn mime_types(self) -> &'static [&'static str] {
        match self {
            AcceptedTypes::Spreadsheet => SPREADSHEET_MIMES,
            AcceptedTypes::SpreadsheetOrCsv => SPREADSHEET_OR_CSV_MIMES,
        }
    }

    pub fn accepts(self, mime_type: &str) -> bool {
        let mime = mime_type.trim();
        self.mime_types()
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime))
    }

    /// Extensions shown to the user in rejection notices.
    pub fn extension_hint(self) -> &'static str {
        match self {
            AcceptedTypes::Spreadsheet => ".xlsx or .xls",
            AcceptedTypes::SpreadsheetOrCsv => ".xlsx, .xls or .csv",
        }
    }
}

/// Why a candidate was refused before transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidType,
    TooLarge,
}

/// Where the bytes of a candidate live until submission.
#[derive(Clone, PartialEq, Eq)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            FileSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

/// A file chosen by the user, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub source: FileSource,
}

impl FileCandidate {
    /// Builds a candidate from an in-memory buffer.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// Builds a candidate from a local path.
    ///
    /// Size comes from metadata; the MIME type from the extension, falling
    /// back to sniffing the file head. Unknown content yields
    /// `application/octet-stream`, which validation then refuses.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("{} is not a file", path.display());
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| path.display().to_string(), str::to_string);

        let mime_type = match mime_type_for_extension(path) {
            Some(mime) => mime.to_string(),
            None => sniff_mime_type(path)?
                .unwrap_or("application/octet-stream")
                .to_string(),
        };

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            mime_type,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Applies the allow-list then the size bound, in that order.
    pub fn validate(&self, accepted: AcceptedTypes) -> Result<(), Rejection> {
        if !accepted.accepts(&self.mime_type) {
            return Err(Rejection::InvalidType);
        }
        if self.size_bytes > MAX_UPLOAD_BYTES {
            return Err(Rejection::TooLarge);
        }
        Ok(())
    }

    /// Loads the bytes for transmission.
    ///
    /// The size bound is checked again on what was actually read, since a
    /// file on disk can grow after it was selected.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        let bytes = match &self.source {
            FileSource::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                let mut bytes = Vec::new();
                file.take(MAX_UPLOAD_BYTES + 1).read_to_end(&mut bytes).await?;
                bytes
            }
            FileSource::Memory(bytes) => bytes.clone(),
        };

        if bytes.len() as u64 > MAX_UPLOAD_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "file exceeds the 10MB upload limit",
            ));
        }
        Ok(bytes)
    }
}

/// Returns MIME type inferred from file extension for supported spreadsheet formats.
#[must_use]
pub fn mime_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;

    match ext.to_ascii_lowercase().as_str() {
        "xlsx" => Some(XLSX_MIME),
        "xls" => Some(XLS_MIME),
        "csv" => Some(CSV_MIME),
        _ => None,
    }
}

fn sniff_mime_type(path: &Path) -> Result<Option<&'static str>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut head = Vec::new();
    file.take(SNIFF_LEN)
        .read_to_end(&mut head)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(detect_mime(&head))
}

/// Content sniffing for files without a useful extension.
fn detect_mime(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

/// Formats a byte count the way the picker shows it (e.g. `2.00 KB`).
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    }
}
