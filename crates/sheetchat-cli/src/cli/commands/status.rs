//! Backend health check.

use anyhow::{Context, Result};
use sheetchat_core::HttpBackend;

pub async fn run(backend: &HttpBackend) -> Result<()> {
    let message = backend
        .health()
        .await
        .with_context(|| format!("backend at {} is not reachable", backend.base_url()))?;
    println!("{message}");
    Ok(())
}
