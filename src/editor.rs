//! Editor core: owns the buffer, history and renderer, and drives the
//! state machine described for line editing. Pure data transformer —
//! no I/O of its own; [`crate::session::SessionAdapter`] drives it
//! against real `AsyncRead`/`AsyncWrite` collaborators.

use crate::buffer::{DeleteRight, EditBuffer};
use crate::decoder::{Action, KeyDecoder};
use crate::history::HistoryRing;
use crate::policy::{Echo, LineMode, Policy};
use crate::renderer::Renderer;

/// Editor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Editing,
    Raw,
    Closed,
}

/// An event produced while feeding characters into the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete line, submitted or flushed at source EOF.
    Line(String),
    /// One raw-mode character, delivered immediately.
    Char(char),
    /// The user sent a break.
    Break,
    /// Soft EOF: `delete-right` (0x04) on an already-empty buffer.
    Eof,
}

#[derive(Debug)]
pub struct Editor {
    buffer: EditBuffer,
    history: HistoryRing,
    decoder: KeyDecoder,
    renderer: Renderer,
    policy: Policy,
    state: State,
}

impl Editor {
    pub fn new(policy: Policy) -> Self {
        let wrap = policy.wrap_mode();
        let width = policy.width;
        let history_size = policy.history_size;
        let state = if policy.line_mode == LineMode::Raw {
            State::Raw
        } else {
            State::Idle
        };
        Editor {
            buffer: EditBuffer::new(),
            history: HistoryRing::new(history_size),
            decoder: KeyDecoder::new(),
            renderer: Renderer::new(wrap, width),
            policy,
            state,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Current in-progress buffer contents, for `IncompleteRead`.
    pub fn pending_text(&self) -> String {
        self.buffer.as_str()
    }

    /// Feed one decoded character. Returns bytes to write to the
    /// outbound sink and zero or more events.
    pub fn feed_char(&mut self, c: char) -> (Vec<u8>, Vec<LineEvent>) {
        if self.state == State::Closed {
            return (Vec::new(), Vec::new());
        }
        if self.policy.line_mode == LineMode::Raw {
            return self.feed_raw(c);
        }

        let actions = self.decoder.feed(c);
        let mut out = Vec::new();
        let mut events = Vec::new();
        for action in actions {
            self.apply_action(action, &mut out, &mut events);
        }
        (out, events)
    }

    fn feed_raw(&mut self, c: char) -> (Vec<u8>, Vec<LineEvent>) {
        let mut out = Vec::new();
        if self.policy.echo == Echo::On {
            push_char(&mut out, c);
        }
        (out, vec![LineEvent::Char(c)])
    }

    fn apply_action(&mut self, action: Action, out: &mut Vec<u8>, events: &mut Vec<LineEvent>) {
        match action {
            Action::Printable(c) => {
                if let Some(max) = self.policy.max_line_length {
                    if self.buffer.len() >= max {
                        return;
                    }
                }
                self.buffer.insert(c);
                self.state = State::Editing;
                self.render(out);
            }
            Action::SubmitLine => {
                let line = self.buffer.as_str();
                self.history.remember(&line);
                self.buffer.clear();
                out.extend(self.renderer.submit());
                events.push(LineEvent::Line(line));
                self.state = State::Idle;
            }
            Action::Break => {
                self.buffer.clear();
                events.push(LineEvent::Break);
                self.state = State::Idle;
            }
            Action::DeleteRightOrSoftEof => match self.buffer.delete_right() {
                DeleteRight::Deleted => self.render(out),
                DeleteRight::NoOp => {}
                DeleteRight::SoftEof => events.push(LineEvent::Eof),
            },
            Action::DeleteLeft => {
                if self.buffer.delete_left() {
                    self.render(out);
                }
            }
            Action::MoveLeft => {
                self.buffer.move_left();
                self.render(out);
            }
            Action::MoveRight => {
                self.buffer.move_right();
                self.render(out);
            }
            Action::MoveHome => {
                self.buffer.move_home();
                self.render(out);
            }
            Action::MoveEnd => {
                self.buffer.move_end();
                self.render(out);
            }
            Action::KillLine => {
                self.buffer.kill_line();
                self.render(out);
            }
            Action::KillToEnd => {
                self.buffer.kill_to_end();
                self.render(out);
            }
            Action::Yank => {
                self.buffer.yank();
                self.render(out);
            }
            Action::Redraw => self.force_render(out),
            Action::HistoryPrev => {
                let current = self.buffer.as_str();
                if let Some(text) = self.history.prev(&current) {
                    let text = text.to_string();
                    self.buffer.load(&text);
                    self.render(out);
                }
            }
            Action::HistoryNext => {
                if let Some(text) = self.history.next() {
                    let text = text.to_string();
                    self.buffer.load(&text);
                    self.render(out);
                }
            }
            Action::Unknown => {}
        }
    }

    fn render(&mut self, out: &mut Vec<u8>) {
        let text = self.buffer.chars().to_vec();
        let cursor = self.buffer.cursor();
        out.extend(self.renderer.sync(&text, cursor, false));
    }

    fn force_render(&mut self, out: &mut Vec<u8>) {
        let text = self.buffer.chars().to_vec();
        let cursor = self.buffer.cursor();
        out.extend(self.renderer.sync(&text, cursor, true));
    }

    /// Terminal resize: invalidate the shadow and force a redraw.
    pub fn resize(&mut self, width: u16, height: u16) -> Vec<u8> {
        self.policy.set_size(width, height);
        let text = self.buffer.chars().to_vec();
        let cursor = self.buffer.cursor();
        self.renderer.resize(width, &text, cursor)
    }

    /// Source closed: flush a non-empty buffer as a final line, then close.
    pub fn source_eof(&mut self) -> (Vec<u8>, Vec<LineEvent>) {
        let mut out = Vec::new();
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let line = self.buffer.as_str();
            self.history.remember(&line);
            self.buffer.clear();
            out.extend(self.renderer.submit());
            events.push(LineEvent::Line(line));
        }
        self.state = State::Closed;
        (out, events)
    }

    pub fn set_echo(&mut self, on: bool) -> Vec<u8> {
        if self.policy.set_echo(on) {
            self.renderer.set_echo_visible(on)
        } else {
            Vec::new()
        }
    }

    /// Switching line mode off mid-line erases the rendered echo and
    /// abandons the in-progress buffer; bytes typed from now on are raw
    /// passthrough, matching the original's loss of the editor's own
    /// buffering once line mode is disabled.
    pub fn set_line_mode(&mut self, line: bool) -> Vec<u8> {
        let changed = self.policy.set_line_mode(line);
        let mut out = Vec::new();
        if changed {
            if line {
                self.state = State::Idle;
            } else {
                out.extend(self.renderer.sync(&[], 0, true));
                self.buffer.clear();
                self.state = State::Raw;
            }
        }
        out
    }
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    fn feed(editor: &mut Editor, s: &str) -> (Vec<u8>, Vec<LineEvent>) {
        let mut out = Vec::new();
        let mut events = Vec::new();
        for c in s.chars() {
            let (o, e) = editor.feed_char(c);
            out.extend(o);
            events.extend(e);
        }
        (out, events)
    }

    #[test]
    fn simple_line_delivers_exact_text() {
        let mut e = Editor::new(Policy::default());
        let (_, events) = feed(&mut e, "abc\n");
        assert_eq!(events, vec![LineEvent::Line("abc".into())]);
    }

    #[test]
    fn erase_left_then_submit() {
        let mut e = Editor::new(Policy::default());
        let (_, events) = feed(&mut e, "abcd\x08\n");
        assert_eq!(events, vec![LineEvent::Line("abc".into())]);
    }

    #[test]
    fn history_previous_recalls_last_line() {
        let mut e = Editor::new(Policy::default());
        let (_, events) = feed(&mut e, "abc\n\x10\n");
        assert_eq!(
            events,
            vec![LineEvent::Line("abc".into()), LineEvent::Line("abc".into())]
        );
    }

    #[test]
    fn history_next_to_bottom_delivers_empty_line() {
        let mut e = Editor::new(Policy::default());
        let (_, events) = feed(&mut e, "abc\n\x10\x0e\n");
        assert_eq!(
            events,
            vec![LineEvent::Line("abc".into()), LineEvent::Line("".into())]
        );
    }

    #[test]
    fn kill_and_yank_twice() {
        let mut e = Editor::new(Policy::default());
        let (_, events) = feed(&mut e, "abc\x15\x19\x19\n");
        assert_eq!(events, vec![LineEvent::Line("abcabc".into())]);
    }

    #[test]
    fn soft_eof_on_empty_buffer() {
        let mut e = Editor::new(Policy::default());
        let (_, events) = feed(&mut e, "\x04");
        assert_eq!(events, vec![LineEvent::Eof]);
    }

    #[test]
    fn breaks_clear_buffer_and_deliver_break_events() {
        let mut e = Editor::new(Policy::default());
        let (_, events) = feed(&mut e, "\x03\x03\x03\x03");
        assert_eq!(events, vec![LineEvent::Break; 4]);
        assert_eq!(e.pending_text(), "");
    }

    #[test]
    fn unknown_key_is_ignored() {
        let mut e = Editor::new(Policy::default());
        let (_, events) = feed(&mut e, "\x07abc\n");
        assert_eq!(events, vec![LineEvent::Line("abc".into())]);
    }

    #[test]
    fn source_eof_flushes_pending_buffer_as_a_line() {
        let mut e = Editor::new(Policy::default());
        let _ = feed(&mut e, "abc");
        let (_, events) = e.source_eof();
        assert_eq!(events, vec![LineEvent::Line("abc".into())]);
        assert_eq!(e.state(), State::Closed);
    }

    #[test]
    fn raw_mode_delivers_each_character_immediately() {
        let mut policy = Policy::default();
        policy.line_mode = LineMode::Raw;
        let mut e = Editor::new(policy);
        let (_, events) = feed(&mut e, "ab");
        assert_eq!(events, vec![LineEvent::Char('a'), LineEvent::Char('b')]);
    }
}
