//! Interactive chat command handler.
//!
//! Each stdin line is a plain Enter. A line ending in `\` acts as
//! Shift+Enter: the text is kept in the draft with a newline and nothing is
//! sent. `:q` quits.

use std::io::{IsTerminal, Write};

use anyhow::{Context, Result};
use sheetchat_core::chat::{KeyDisposition, KeyPress};
use sheetchat_core::config::Config;
use sheetchat_core::{ChatClient, HttpBackend};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::upload::upload_file;
use crate::render;

const QUIT_COMMAND: &str = ":q";

pub async fn run(config: &Config, backend: &HttpBackend, file: &str) -> Result<()> {
    let session = upload_file(config, backend, file).await?;
    let mut chat = ChatClient::new(session);

    render::print_session_header(chat.session());
    let mut rendered = render::print_since(chat.transcript(), 0);

    let interactive = std::io::stdin().is_terminal();
    if interactive {
        eprintln!("Type a question and press Enter. End a line with \\ for a newline, {QUIT_COMMAND} to quit.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("> ");
            std::io::stderr().flush().context("flush stderr")?;
        }

        let Some(line) = lines.next_line().await.context("read stdin")? else {
            break;
        };

        if chat.draft().is_empty() && line.trim() == QUIT_COMMAND {
            break;
        }

        let (text, key) = match line.strip_suffix('\\') {
            Some(rest) => (rest, KeyPress::shift_enter()),
            None => (line.as_str(), KeyPress::enter()),
        };

        let mut draft = chat.draft().to_string();
        draft.push_str(text);
        chat.set_draft(draft);

        if chat.handle_key_commit(backend, key).await == KeyDisposition::PassThrough {
            let mut draft = chat.draft().to_string();
            draft.push('\n');
            chat.set_draft(draft);
            continue;
        }

        // Blank drafts are ignored by the client; start fresh.
        if chat.draft().trim().is_empty() {
            chat.set_draft(String::new());
        }

        rendered = render::print_since(chat.transcript(), rendered);
    }

    println!("Goodbye!");
    Ok(())
}
