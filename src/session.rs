//! Session adapter: the only surface visible to applications hosting a
//! session. Drives the pure [`Editor`] against `AsyncRead`/`AsyncWrite`
//! collaborators one byte at a time, the same shape as the teacher's
//! `read_loop`/`handle_connection`, but generic over the transport
//! instead of owning a telnet/SSH socket directly.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::editor::{Editor, LineEvent, State};
use crate::error::{EditorError, EditorResult};
use crate::policy::{Encoding, Policy};
use crate::utf8::Utf8Decoder;

/// Outcome of a break as decided by session-level policy, resolving the
/// editor's "fourth consecutive break" open question as a consumer
/// concern rather than a built-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakAction {
    /// Propagate the break as an interrupt to the pending read.
    Continue,
    /// Swallow the break and deliver `0` as if it were a submitted line.
    Literal(String),
}

/// Called with the number of consecutive breaks observed (resets to 0
/// after any successful line or a `Literal` break). Boxed so hosts can
/// close over their own state without the editor reaching into it.
pub type BreakPolicy = Box<dyn Fn(u32) -> BreakAction + Send + Sync>;

pub struct SessionAdapter<R, W> {
    editor: Editor,
    source: R,
    sink: W,
    utf8: Utf8Decoder,
    break_policy: Option<BreakPolicy>,
    consecutive_breaks: u32,
    pending_resize: Option<(u16, u16)>,
    /// Raw bytes carried over when the editor is disabled (passthrough).
    passthrough_buf: VecDeque<u8>,
}

impl<R, W> SessionAdapter<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(policy: Policy, source: R, sink: W) -> Self {
        SessionAdapter {
            editor: Editor::new(policy),
            source,
            sink,
            utf8: Utf8Decoder::new(),
            break_policy: None,
            consecutive_breaks: 0,
            pending_resize: None,
            passthrough_buf: VecDeque::new(),
        }
    }

    pub fn with_break_policy(mut self, policy: BreakPolicy) -> Self {
        self.break_policy = Some(policy);
        self
    }

    pub fn get_encoding(&self) -> Option<Encoding> {
        self.editor.policy().encoding
    }

    /// Write bytes verbatim to the outbound sink (application output,
    /// not editor echo).
    pub async fn write(&mut self, s: &str) -> EditorResult<()> {
        self.sink.write_all(s.as_bytes()).await?;
        self.sink.flush().await?;
        Ok(())
    }

    pub async fn write_eof(&mut self) -> EditorResult<()> {
        self.sink.shutdown().await?;
        Ok(())
    }

    pub fn set_echo(&mut self, on: bool) {
        // Always produces empty bytes (§4.5 Echo-off); nothing to flush.
        let _ = self.editor.set_echo(on);
    }

    pub async fn set_line_mode(&mut self, line: bool) -> EditorResult<()> {
        let bytes = self.editor.set_line_mode(line);
        self.flush_bytes(bytes).await
    }

    /// Mirrors `TerminalSizeChanged`: invalidates the renderer shadow
    /// immediately and arranges for the next pending read to be
    /// interrupted with `EditorError::Resized`.
    pub async fn change_terminal_size(&mut self, width: u16, height: u16) -> EditorResult<()> {
        tracing::info!(width, height, "terminal resize observed");
        let bytes = self.editor.resize(width, height);
        self.pending_resize = Some((width, height));
        self.flush_bytes(bytes).await
    }

    async fn flush_bytes(&mut self, bytes: Vec<u8>) -> EditorResult<()> {
        if !bytes.is_empty() {
            self.sink.write_all(&bytes).await?;
            self.sink.flush().await?;
        }
        Ok(())
    }

    /// Read a complete line, or an out-of-band interrupt.
    pub async fn read_line(&mut self) -> EditorResult<String> {
        if self.editor.policy().editor_disabled() {
            return self.read_line_passthrough().await;
        }

        loop {
            if let Some((width, height)) = self.pending_resize.take() {
                return Err(EditorError::Resized { width, height });
            }
            if self.editor.state() == State::Closed {
                return Err(EditorError::Closed);
            }

            let mut byte = [0u8; 1];
            let n = self.source.read(&mut byte).await?;
            if n == 0 {
                tracing::debug!("source closed during read_line");
                let (out, events) = self.editor.source_eof();
                self.flush_bytes(out).await?;
                for event in events {
                    if let LineEvent::Line(line) = event {
                        return Ok(line);
                    }
                }
                return Err(EditorError::Closed);
            }
            tracing::trace!(byte = byte[0], "read byte");

            for c in self.utf8.feed(&byte) {
                let (out, events) = self.editor.feed_char(c);
                self.flush_bytes(out).await?;
                for event in events {
                    match event {
                        LineEvent::Line(line) => {
                            tracing::debug!(%line, "line delivered");
                            self.consecutive_breaks = 0;
                            return Ok(line);
                        }
                        LineEvent::Eof => return Ok(String::new()),
                        LineEvent::Break => {
                            tracing::info!(consecutive = self.consecutive_breaks + 1, "break observed");
                            if let Some(line) = self.handle_break() {
                                return Ok(line);
                            }
                            return Err(EditorError::Break);
                        }
                        LineEvent::Char(_) => unreachable!("line mode never emits raw chars"),
                    }
                }
            }
        }
    }

    /// Read up to `n` characters, in raw mode returning as soon as any
    /// are available; in line mode, up to the next line boundary.
    pub async fn read(&mut self, n: usize) -> EditorResult<String> {
        if self.editor.policy().editor_disabled() {
            return self.read_passthrough(n).await;
        }

        let mut collected = String::new();
        loop {
            if let Some((width, height)) = self.pending_resize.take() {
                return Err(EditorError::Resized { width, height });
            }
            if collected.chars().count() >= n {
                return Ok(collected);
            }
            if self.editor.state() == State::Closed {
                return Err(EditorError::IncompleteRead {
                    partial: collected,
                    requested: n,
                });
            }

            let mut byte = [0u8; 1];
            let read_n = self.source.read(&mut byte).await?;
            if read_n == 0 {
                tracing::debug!("source closed during read");
                let (out, _) = self.editor.source_eof();
                self.flush_bytes(out).await?;
                return Err(EditorError::IncompleteRead {
                    partial: collected,
                    requested: n,
                });
            }
            tracing::trace!(byte = byte[0], "read byte");

            for c in self.utf8.feed(&byte[..read_n]) {
                let (out, events) = self.editor.feed_char(c);
                self.flush_bytes(out).await?;
                for event in events {
                    match event {
                        LineEvent::Char(ch) => collected.push(ch),
                        LineEvent::Line(line) => {
                            tracing::debug!(%line, "line delivered");
                            self.consecutive_breaks = 0;
                            collected.push_str(&line);
                            collected.push('\n');
                            if collected.chars().count() >= n {
                                return Ok(collected);
                            }
                        }
                        LineEvent::Eof => return Ok(collected),
                        LineEvent::Break => {
                            tracing::info!(consecutive = self.consecutive_breaks + 1, "break observed");
                            if let Some(line) = self.handle_break() {
                                collected.push_str(&line);
                                return Ok(collected);
                            }
                            return Err(EditorError::Break);
                        }
                    }
                }
            }
        }
    }

    /// Returns `Some(literal)` if the break policy wants it delivered
    /// as ordinary data instead of propagated as an interrupt.
    fn handle_break(&mut self) -> Option<String> {
        self.consecutive_breaks += 1;
        let action = self
            .break_policy
            .as_ref()
            .map(|policy| policy(self.consecutive_breaks))
            .unwrap_or(BreakAction::Continue);
        match action {
            BreakAction::Continue => None,
            BreakAction::Literal(text) => {
                tracing::info!(%text, "break resolved to literal delivery");
                self.consecutive_breaks = 0;
                Some(text)
            }
        }
    }

    async fn read_line_passthrough(&mut self) -> EditorResult<String> {
        let mut line = Vec::new();
        loop {
            let mut byte = [0u8; 1];
            let n = self.source.read(&mut byte).await?;
            if n == 0 {
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if byte[0] == b'\n' {
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            line.push(byte[0]);
        }
    }

    async fn read_passthrough(&mut self, n: usize) -> EditorResult<String> {
        while self.passthrough_buf.len() < n {
            let mut byte = [0u8; 1];
            let read_n = self.source.read(&mut byte).await?;
            if read_n == 0 {
                let partial = String::from_utf8_lossy(self.passthrough_buf.make_contiguous()).into_owned();
                self.passthrough_buf.clear();
                return Err(EditorError::IncompleteRead {
                    partial,
                    requested: n,
                });
            }
            self.passthrough_buf.push_back(byte[0]);
        }
        let bytes: Vec<u8> = self.passthrough_buf.drain(..n).collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
