//! Minimal in-memory host loop, mirroring the behavior the line
//! editor's scenario table is specified against: read a line, echo it
//! back prefixed with `>>>`, counting consecutive breaks and retiring
//! the fourth as a literal `BREAK`.

use ssh_line_editor::{BreakAction, Policy, SessionAdapter, TermType};
use tokio::io::duplex;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let (client, server) = duplex(4096);
    let (client_read, mut client_write) = tokio::io::split(client);
    let (server_read, server_write) = tokio::io::split(server);

    let mut policy = Policy::default();
    policy.term_type = TermType::Ansi;

    let break_policy: ssh_line_editor::BreakPolicy = Box::new(|count| {
        if count >= 4 {
            BreakAction::Literal("BREAK".to_string())
        } else {
            BreakAction::Continue
        }
    });

    let mut session = SessionAdapter::new(policy, server_read, server_write).with_break_policy(break_policy);

    let handler = tokio::spawn(async move {
        let mut data = String::new();
        loop {
            match session.read_line().await {
                Ok(line) => {
                    data.push_str(&line);
                    break;
                }
                Err(ssh_line_editor::EditorError::Break) => continue,
                Err(ssh_line_editor::EditorError::Closed) => break,
                Err(_) => break,
            }
        }
        let _ = session.write(&format!(">>>{data}\r\n")).await;
        let _ = session.write_eof().await;
    });

    use tokio::io::AsyncWriteExt;
    client_write.write_all(b"hello\n").await.unwrap();
    drop(client_write);

    let _ = handler.await;
    let _ = client_read;
}
