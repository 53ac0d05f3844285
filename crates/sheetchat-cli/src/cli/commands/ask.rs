//! One-shot question against an existing session.

use anyhow::Result;
use sheetchat_core::{ChatClient, HttpBackend, Session};

pub async fn run(backend: &HttpBackend, room: &str, name: &str, query: &str) -> Result<()> {
    if query.trim().is_empty() {
        anyhow::bail!("Query must not be empty");
    }

    let mut chat = ChatClient::new(Session::new(name, room));
    if let Some(reply) = chat.send_query(backend, query).await {
        println!("{}", reply.content);
    }
    Ok(())
}
