//! Upload command handler.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use sheetchat_core::config::Config;
use sheetchat_core::files::format_size;
use sheetchat_core::{FileCandidate, HttpBackend, NoticeSink, Session, UploadClient};

use crate::render::StderrNotices;

pub async fn run(config: &Config, backend: &HttpBackend, file: &str) -> Result<()> {
    let session = upload_file(config, backend, file).await?;
    println!("{}", session.session_id);
    Ok(())
}

/// Selects `file`, submits it, and returns the session on success.
///
/// Notices are printed as they happen; the returned error only summarizes.
pub async fn upload_file(config: &Config, backend: &HttpBackend, file: &str) -> Result<Session> {
    let path = Path::new(file);
    let candidate = FileCandidate::from_path(path)
        .with_context(|| format!("select {}", path.display()))?;
    let label = format!("{} ({})", candidate.name, format_size(candidate.size_bytes));

    let notices: Arc<dyn NoticeSink> = Arc::new(StderrNotices);
    let mut upload = UploadClient::new(config.accepted_types(), notices);
    if !upload.select_file(candidate) {
        bail!("{} was not accepted for upload", path.display());
    }
    eprintln!("  {label}");

    match upload.submit_selected_file(backend).await {
        Some(session) => Ok(session),
        None => bail!("upload of {} failed", path.display()),
    }
}
