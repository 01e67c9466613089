//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Diagnostics and input-stream bookkeeping for pcpp
//

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

// ============================================================================
// Source Position
// ============================================================================

/// Source position attached to every token: which input stream it came from
/// and the line it appeared on. Column tracking is intentionally absent; the
/// preprocessor reports positions at line granularity only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Stream index (which file or synthetic source)
    pub stream: u16,
    /// Line number (1-based)
    pub line: u32,
}

impl Position {
    pub fn new(stream: u16, line: u32) -> Self {
        Self { stream, line }
    }

    /// Position for tokens with no meaningful source, such as seeded
    /// built-in macro bodies and END padding.
    pub fn none() -> Self {
        Self {
            stream: u16::MAX,
            line: 0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.stream == u16::MAX && self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", stream_name(self.stream), self.line)
    }
}

// ============================================================================
// Stream Registry
// ============================================================================

/// One registered input source: a file, stdin, or a synthetic line.
#[derive(Debug, Clone)]
struct Stream {
    name: String,
}

#[derive(Debug, Default)]
struct StreamRegistry {
    streams: Vec<Stream>,
}

thread_local! {
    static STREAMS: RefCell<StreamRegistry> = RefCell::new(StreamRegistry::default());
}

/// Register a new input stream, returning its id.
pub fn init_stream(name: &str) -> u16 {
    STREAMS.with(|s| {
        let mut reg = s.borrow_mut();
        let id = reg.streams.len() as u16;
        reg.streams.push(Stream {
            name: name.to_string(),
        });
        id
    })
}

/// Get the registered name of a stream.
pub fn stream_name(id: u16) -> String {
    STREAMS.with(|s| {
        s.borrow()
            .streams
            .get(id as usize)
            .map(|st| st.name.clone())
            .unwrap_or_else(|| "<unknown>".to_string())
    })
}

/// Drop all registered streams. Called when preprocessing state is
/// reinitialized between translation units.
pub fn clear_streams() {
    STREAMS.with(|s| s.borrow_mut().streams.clear());
}

// ============================================================================
// Error Tracking
// ============================================================================

static ERROR_COUNT: AtomicU32 = AtomicU32::new(0);
static WARNING_COUNT: AtomicU32 = AtomicU32::new(0);

pub fn error_count() -> u32 {
    ERROR_COUNT.load(Ordering::Relaxed)
}

pub fn warning_count() -> u32 {
    WARNING_COUNT.load(Ordering::Relaxed)
}

/// Reset counters at the start of a translation unit.
pub fn reset_counts() {
    ERROR_COUNT.store(0, Ordering::Relaxed);
    WARNING_COUNT.store(0, Ordering::Relaxed);
}

// ============================================================================
// Diagnostic Output
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiagLevel {
    Warning,
    Error,
}

impl DiagLevel {
    fn prefix(&self) -> &'static str {
        match self {
            DiagLevel::Warning => "warning: ",
            DiagLevel::Error => "error: ",
        }
    }
}

fn prettify_path(path: &str) -> String {
    path.strip_prefix("./")
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.to_string())
}

fn do_diag(level: DiagLevel, pos: Position, msg: &str) {
    match level {
        DiagLevel::Error => {
            ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        DiagLevel::Warning => {
            WARNING_COUNT.fetch_add(1, Ordering::Relaxed);
        }
    }

    if pos.is_none() {
        eprintln!("pcpp: {}{}", level.prefix(), msg);
        return;
    }

    let name = prettify_path(&stream_name(pos.stream));
    eprintln!("{}:{}: {}{}", name, pos.line, level.prefix(), msg);
}

/// Print a warning. Warnings never abort preprocessing.
pub fn warning(pos: Position, msg: &str) {
    do_diag(DiagLevel::Warning, pos, msg);
}

/// Print an error and bump the global error count. Fatal call sites pair
/// this with a `PpError` return.
pub fn error(pos: Position, msg: &str) {
    do_diag(DiagLevel::Error, pos, msg);
}

// ============================================================================
// Fatal Errors
// ============================================================================

/// Kind of fatal preprocessing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpErrorKind {
    /// End of file inside a function-like macro argument list
    UnbalancedInvocation,
    /// Malformed `defined` operator in a conditional directive
    BadDefined,
    /// `consume` met a token of the wrong kind
    UnexpectedToken,
    /// A directive that terminates preprocessing (#error, missing include)
    Directive,
    /// Output sink failure
    Io,
}

/// A fatal preprocessing error. The message has already been written to
/// stderr via `error()` by the time this value is constructed; it unwinds
/// to the driver, which terminates with a non-zero exit status. No tokens
/// are delivered to the parser after a fatal error.
#[derive(Debug, Clone)]
pub struct PpError {
    pub kind: PpErrorKind,
    pub message: String,
    pub pos: Position,
}

impl PpError {
    pub fn new(kind: PpErrorKind, message: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            pos,
        }
    }

    /// Report the error through the diagnostic sink and return it.
    pub fn raise(kind: PpErrorKind, message: impl Into<String>, pos: Position) -> Self {
        let message = message.into();
        error(pos, &message);
        Self { kind, message, pos }
    }
}

impl fmt::Display for PpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pos.is_none() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.pos, self.message)
        }
    }
}

impl std::error::Error for PpError {}

impl From<std::io::Error> for PpError {
    fn from(e: std::io::Error) -> Self {
        Self::new(PpErrorKind::Io, e.to_string(), Position::none())
    }
}

pub type PpResult<T> = Result<T, PpError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        clear_streams();
        let stream = init_stream("test.c");
        let pos = Position::new(stream, 10);
        assert_eq!(format!("{}", pos), "test.c:10");
    }

    #[test]
    fn test_none_position() {
        let pos = Position::none();
        assert!(pos.is_none());
        assert!(!Position::new(0, 1).is_none());
    }

    #[test]
    fn test_stream_registry() {
        clear_streams();
        let s1 = init_stream("main.c");
        let s2 = init_stream("header.h");
        assert_eq!(stream_name(s1), "main.c");
        assert_eq!(stream_name(s2), "header.h");
        assert_eq!(stream_name(999), "<unknown>");
    }

    #[test]
    fn test_prettify_path() {
        assert_eq!(prettify_path("./test.c"), "test.c");
        assert_eq!(prettify_path("src/a.c"), "src/a.c");
    }

    #[test]
    fn test_error_counting() {
        reset_counts();
        clear_streams();
        let stream = init_stream("test.c");
        let pos = Position::new(stream, 1);

        error(pos, "test error");
        assert_eq!(error_count(), 1);

        warning(pos, "test warning");
        assert_eq!(warning_count(), 1);

        reset_counts();
        assert_eq!(error_count(), 0);
    }

    #[test]
    fn test_raise_reports() {
        reset_counts();
        clear_streams();
        let stream = init_stream("test.c");
        let err = PpError::raise(PpErrorKind::BadDefined, "bad defined", Position::new(stream, 3));
        assert_eq!(err.kind, PpErrorKind::BadDefined);
        assert_eq!(error_count(), 1);
        assert_eq!(format!("{}", err), "test.c:3: bad defined");
    }
}
