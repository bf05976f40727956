//! Session policy: the external-collaborator configuration snapshot
//! the editor is constructed with and updated through, per the
//! "mutable policy read lazily" redesign note — no implicit reads of
//! channel attributes, only this struct and its setters.

use serde::Deserialize;

/// Wire/display encoding of the session. `Bytes` (or terminal type
/// `None`) bypasses the editor entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Text,
    Bytes,
}

/// Whether line editing is active (`line`) or every character is
/// delivered verbatim as it arrives (`raw`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineMode {
    Line,
    Raw,
}

/// Echo visibility for buffer mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Echo {
    On,
    Off,
}

/// Renderer strategy selected by terminal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wrap {
    Wrap,
    Truncate,
}

/// Reported terminal type. `None` disables the editor outright (the
/// session has no pseudo-terminal at all).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermType {
    Ansi,
    Dumb,
    None,
}

impl TermType {
    fn wrap(&self) -> Wrap {
        match self {
            TermType::Ansi => Wrap::Wrap,
            TermType::Dumb | TermType::None => Wrap::Truncate,
        }
    }
}

/// Configuration snapshot the editor is constructed with. Plain struct,
/// no CLI/env/file reads inside this crate — the host owns that.
#[derive(Debug, Clone, Deserialize)]
pub struct Policy {
    pub term_type: TermType,
    #[serde(default = "default_width")]
    pub width: u16,
    #[serde(default = "default_height")]
    pub height: u16,
    #[serde(default = "default_echo")]
    pub echo: Echo,
    #[serde(default = "default_line_mode")]
    pub line_mode: LineMode,
    #[serde(default = "default_encoding")]
    pub encoding: Option<Encoding>,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default)]
    pub max_line_length: Option<usize>,
}

fn default_width() -> u16 {
    80
}
fn default_height() -> u16 {
    24
}
fn default_echo() -> Echo {
    Echo::On
}
fn default_line_mode() -> LineMode {
    LineMode::Line
}
fn default_encoding() -> Option<Encoding> {
    Some(Encoding::Text)
}
fn default_history_size() -> usize {
    1000
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            term_type: TermType::Ansi,
            width: default_width(),
            height: default_height(),
            echo: default_echo(),
            line_mode: default_line_mode(),
            encoding: default_encoding(),
            history_size: default_history_size(),
            max_line_length: None,
        }
    }
}

impl Policy {
    /// Wrap-vs-truncate rendering mode implied by `term_type`.
    pub fn wrap_mode(&self) -> Wrap {
        self.term_type.wrap()
    }

    /// The editor is entirely bypassed: no terminal, or bytes encoding,
    /// or the host explicitly turned line editing off.
    pub fn editor_disabled(&self) -> bool {
        matches!(self.term_type, TermType::None) || matches!(self.encoding, None | Some(Encoding::Bytes))
    }

    /// Returns whether the value actually changed, so callers can skip
    /// shadow invalidation on a no-op toggle (the corpus sets echo off
    /// twice in a row specifically to exercise this path).
    pub fn set_echo(&mut self, on: bool) -> bool {
        let new = if on { Echo::On } else { Echo::Off };
        let changed = new != self.echo;
        self.echo = new;
        changed
    }

    pub fn set_line_mode(&mut self, line: bool) -> bool {
        let new = if line { LineMode::Line } else { LineMode::Raw };
        let changed = new != self.line_mode;
        self.line_mode = new;
        changed
    }

    /// Returns whether the dimensions actually changed.
    pub fn set_size(&mut self, width: u16, height: u16) -> bool {
        let changed = width != self.width || height != self.height;
        self.width = width;
        self.height = height;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let p = Policy::default();
        assert_eq!(p.width, 80);
        assert_eq!(p.height, 24);
        assert_eq!(p.history_size, 1000);
        assert_eq!(p.wrap_mode(), Wrap::Wrap);
        assert!(!p.editor_disabled());
    }

    #[test]
    fn dumb_terminal_truncates() {
        let mut p = Policy::default();
        p.term_type = TermType::Dumb;
        assert_eq!(p.wrap_mode(), Wrap::Truncate);
    }

    #[test]
    fn none_terminal_or_bytes_disables_editor() {
        let mut p = Policy::default();
        p.term_type = TermType::None;
        assert!(p.editor_disabled());

        let mut p2 = Policy::default();
        p2.encoding = Some(Encoding::Bytes);
        assert!(p2.editor_disabled());

        let mut p3 = Policy::default();
        p3.encoding = None;
        assert!(p3.editor_disabled());
    }

    #[test]
    fn set_echo_twice_is_idempotent_the_second_time() {
        let mut p = Policy::default();
        assert!(p.set_echo(false));
        assert!(!p.set_echo(false));
        assert!(p.set_echo(true));
    }
}
