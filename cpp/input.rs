//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Line source for pcpp
//
// Produces logical source lines: backslash-newline splices are joined and
// comments are replaced by a single space before the tokenizer ever runs.
// A stack of open sources implements #include; the top of the stack is
// always the file being read.
//

use crate::diag::{self, Position};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One logical line handed to the tokenizer: splices resolved, comments
/// removed, no trailing newline. `line` is the number of the first physical
/// line that contributed to it.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    pub text: String,
    pub stream: u16,
    pub line: u32,
}

// ============================================================================
// Source files
// ============================================================================

#[derive(Debug)]
struct SourceFile {
    stream: u16,
    path: PathBuf,
    bytes: Vec<u8>,
    offset: usize,
    /// Number of the next physical line to be read (1-based; #line rewrites it)
    line: u32,
}

impl SourceFile {
    fn new(stream: u16, path: PathBuf, bytes: Vec<u8>) -> Self {
        Self {
            stream,
            path,
            bytes,
            offset: 0,
            line: 1,
        }
    }

    fn exhausted(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Read one physical line, consuming the `\n`, `\r\n` or `\r`
    /// terminator. Invalid UTF-8 is replaced rather than rejected; the
    /// tokenizer only ever inspects ASCII.
    fn physical_line(&mut self) -> Option<String> {
        if self.exhausted() {
            return None;
        }
        let start = self.offset;
        let mut end = start;
        while end < self.bytes.len() {
            let b = self.bytes[end];
            if b == b'\n' || b == b'\r' {
                break;
            }
            end += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..end]).into_owned();
        self.offset = end;
        if self.offset < self.bytes.len() {
            if self.bytes[self.offset] == b'\r' {
                self.offset += 1;
                if self.offset < self.bytes.len() && self.bytes[self.offset] == b'\n' {
                    self.offset += 1;
                }
            } else {
                self.offset += 1;
            }
        }
        self.line += 1;
        Some(text)
    }
}

// ============================================================================
// Comment stripping
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    BlockComment,
}

/// Append `raw` to `out` with comments removed. A `//` comment drops the
/// rest of the line; a `/* */` comment becomes one space and may leave the
/// scanner in `BlockComment`, in which case the caller must feed the next
/// physical line. Quoted literals are opaque to comment markers.
fn strip_comments(out: &mut String, raw: &str, mut state: ScanState) -> ScanState {
    let bytes = raw.as_bytes();
    let mut i = 0;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            ScanState::BlockComment => {
                if b == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    state = ScanState::Code;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            ScanState::Code => {
                if let Some(q) = quote {
                    out.push(b as char);
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == q {
                        quote = None;
                    }
                    i += 1;
                } else if b == b'"' || b == b'\'' {
                    quote = Some(b);
                    out.push(b as char);
                    i += 1;
                } else if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    break;
                } else if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
                    out.push(' ');
                    state = ScanState::BlockComment;
                    i += 2;
                } else {
                    out.push(b as char);
                    i += 1;
                }
            }
        }
    }
    state
}

// ============================================================================
// Input stack
// ============================================================================

/// Stack of open input sources. `next_logical_line` always reads from the
/// top; an exhausted include pops back to the including file.
#[derive(Debug, Default)]
pub struct InputStack {
    files: Vec<SourceFile>,
}

impl InputStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file and make it the current source.
    pub fn push_file(&mut self, path: &Path) -> io::Result<()> {
        let bytes = fs::read(path)?;
        let name = path.to_string_lossy();
        let stream = diag::init_stream(&name);
        self.files
            .push(SourceFile::new(stream, path.to_path_buf(), bytes));
        Ok(())
    }

    /// Make an in-memory buffer the current source (stdin, tests).
    pub fn push_buffer(&mut self, name: &str, bytes: Vec<u8>) {
        let stream = diag::init_stream(name);
        self.files
            .push(SourceFile::new(stream, PathBuf::from(name), bytes));
    }

    /// Number of open sources; the include depth is this minus one.
    pub fn depth(&self) -> usize {
        self.files.len()
    }

    /// Directory of the file currently being read, for quote includes.
    pub fn current_dir(&self) -> PathBuf {
        self.files
            .last()
            .and_then(|f| f.path.parent().map(|p| p.to_path_buf()))
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Position of the next line to be read, for directives that report
    /// against the current file.
    pub fn current_pos(&self) -> Position {
        self.files
            .last()
            .map(|f| Position::new(f.stream, f.line))
            .unwrap_or_else(Position::none)
    }

    /// Apply a #line directive: the next physical line reports as `line`,
    /// optionally under a new presumed file name.
    pub fn set_line_override(&mut self, line: u32, file: Option<&str>) {
        if let Some(f) = self.files.last_mut() {
            f.line = line;
            if let Some(name) = file {
                f.stream = diag::init_stream(name);
            }
        }
    }

    /// Drop all open sources.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Produce the next logical line, or None at the end of the final
    /// source. Splices are joined and comments removed here, so a block
    /// comment (or a spliced line) may consume several physical lines.
    pub fn next_logical_line(&mut self) -> Option<LogicalLine> {
        loop {
            let file = self.files.last_mut()?;
            if file.exhausted() {
                self.files.pop();
                continue;
            }

            let stream = file.stream;
            let first_line = file.line;
            let mut text = String::new();
            let mut state = ScanState::Code;

            loop {
                // splice first: backslash-newline joins physical lines
                // before comment markers are examined
                let mut raw = String::new();
                loop {
                    match file.physical_line() {
                        Some(l) => {
                            if let Some(stripped) = l.strip_suffix('\\') {
                                raw.push_str(stripped);
                            } else {
                                raw.push_str(&l);
                                break;
                            }
                        }
                        None => break,
                    }
                }

                state = strip_comments(&mut text, &raw, state);
                if state == ScanState::Code {
                    break;
                }
                if file.exhausted() {
                    diag::warning(
                        Position::new(stream, first_line),
                        "end of file in the middle of a comment",
                    );
                    break;
                }
            }

            return Some(LogicalLine {
                text,
                stream,
                line: first_line,
            });
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_from(src: &str) -> InputStack {
        diag::clear_streams();
        let mut input = InputStack::new();
        input.push_buffer("test.c", src.as_bytes().to_vec());
        input
    }

    fn all_lines(src: &str) -> Vec<String> {
        let mut input = stack_from(src);
        let mut lines = Vec::new();
        while let Some(l) = input.next_logical_line() {
            lines.push(l.text);
        }
        lines
    }

    #[test]
    fn test_plain_lines() {
        assert_eq!(all_lines("a\nb\nc\n"), vec!["a", "b", "c"]);
        // no trailing newline on the last line
        assert_eq!(all_lines("a\nb"), vec!["a", "b"]);
    }

    #[test]
    fn test_crlf_and_cr() {
        assert_eq!(all_lines("a\r\nb\rc\n"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_splice() {
        assert_eq!(all_lines("ab\\\ncd\n"), vec!["abcd"]);
        assert_eq!(all_lines("a\\\nb\\\nc\n"), vec!["abc"]);
    }

    #[test]
    fn test_line_numbers_after_splice() {
        let mut input = stack_from("a\\\nb\nc\n");
        let l1 = input.next_logical_line().unwrap();
        assert_eq!(l1.text, "ab");
        assert_eq!(l1.line, 1);
        let l2 = input.next_logical_line().unwrap();
        assert_eq!(l2.text, "c");
        assert_eq!(l2.line, 3);
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(all_lines("a // rest\nb\n"), vec!["a ", "b"]);
    }

    #[test]
    fn test_block_comment_one_line() {
        assert_eq!(all_lines("a/*x*/b\n"), vec!["a b"]);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        // the comment joins its start and end lines into one logical line
        assert_eq!(all_lines("a /* one\ntwo */ b\nc\n"), vec!["a   b", "c"]);
    }

    #[test]
    fn test_comment_markers_in_string() {
        assert_eq!(all_lines("\"/* not */\" x\n"), vec!["\"/* not */\" x"]);
        assert_eq!(all_lines("\"//\" y\n"), vec!["\"//\" y"]);
    }

    #[test]
    fn test_include_stack() {
        diag::clear_streams();
        let mut input = InputStack::new();
        input.push_buffer("outer.c", b"a\nb\n".to_vec());
        assert_eq!(input.next_logical_line().unwrap().text, "a");
        input.push_buffer("inner.h", b"x\n".to_vec());
        assert_eq!(input.next_logical_line().unwrap().text, "x");
        // inner exhausted, back to outer
        assert_eq!(input.next_logical_line().unwrap().text, "b");
        assert!(input.next_logical_line().is_none());
    }

    #[test]
    fn test_line_override() {
        diag::clear_streams();
        let mut input = InputStack::new();
        input.push_buffer("t.c", b"a\nb\n".to_vec());
        input.next_logical_line().unwrap();
        input.set_line_override(100, None);
        let l = input.next_logical_line().unwrap();
        assert_eq!(l.line, 100);
    }
}
