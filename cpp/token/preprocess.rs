//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Preprocessing core for pcpp
//
// Demand-driven pipeline between the line source and the parser. One
// logical line at a time is assembled into a token array (joining
// function-like macro invocations that span physical lines), expanded,
// post-processed and pushed onto a lookahead deque that the parser reads
// through next/peek/consume.
//
// The scratch line always ends with exactly one NEWLINE token and never
// contains END; END from this module means end of translation unit.
//

use crate::diag::{self, Position, PpError, PpErrorKind, PpResult};
use crate::input::InputStack;
use crate::strings::{StringId, StringTable};
use crate::token::convert;
use crate::token::directive::Conditional;
use crate::token::lexer::{
    show_token, token_spelling, tokenize, Keyword, LineCursor, Token, TokenType,
};
use crate::token::macros::{MacroKind, MacroTable};
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;

const LPAREN: u32 = b'(' as u32;
const RPAREN: u32 = b')' as u32;
const HASH: u32 = b'#' as u32;

// ============================================================================
// Well-known identifiers
// ============================================================================

/// Identifiers the assembler and directive evaluator compare against on
/// every line, interned once at startup.
pub(crate) struct KnownIds {
    pub defined: StringId,
    pub define: StringId,
    pub undef: StringId,
    pub ifdef: StringId,
    pub ifndef: StringId,
    pub elif: StringId,
    pub endif: StringId,
    pub include: StringId,
    pub error: StringId,
    pub warning: StringId,
    pub line: StringId,
    pub pragma: StringId,
    /// The `_Pragma` operator
    pub pragma_op: StringId,
    pub va_args: StringId,
}

impl KnownIds {
    fn new(strings: &mut StringTable) -> Self {
        Self {
            defined: strings.intern("defined"),
            define: strings.intern("define"),
            undef: strings.intern("undef"),
            ifdef: strings.intern("ifdef"),
            ifndef: strings.intern("ifndef"),
            elif: strings.intern("elif"),
            endif: strings.intern("endif"),
            include: strings.intern("include"),
            error: strings.intern("error"),
            warning: strings.intern("warning"),
            line: strings.intern("line"),
            pragma: strings.intern("pragma"),
            pragma_op: strings.intern("_Pragma"),
            va_args: strings.intern("__VA_ARGS__"),
        }
    }
}

// ============================================================================
// Preprocessor
// ============================================================================

/// The preprocessing context: every process-wide singleton of the pipeline
/// lives here, with explicit init (new) and clear for reuse between
/// translation units.
pub struct Preprocessor {
    pub(crate) strings: StringTable,
    pub(crate) macros: MacroTable,
    pub(crate) input: InputStack,
    pub(crate) cond_stack: Vec<Conditional>,
    pub(crate) include_dirs: Vec<String>,
    pub(crate) ids: KnownIds,

    /// Cursor into the logical line currently being tokenized. None iff
    /// the next read must fetch a new line.
    cursor: Option<LineCursor>,
    /// Single token of pushback used when an invocation probe reads one
    /// token too far
    pushed_back: Option<Token>,
    /// The logical line under assembly and expansion
    line: Vec<Token>,
    /// Post-processed tokens awaiting the parser
    lookahead: VecDeque<Token>,
    /// -E mode: preserve NEWLINE tokens, skip conversions and merging
    output_preprocessed: bool,
    verbose: bool,
    cmdline_stream: u16,
}

impl Preprocessor {
    pub fn new() -> Self {
        let mut strings = StringTable::new();
        let ids = KnownIds::new(&mut strings);
        let mut macros = MacroTable::new();
        macros.seed_builtins(&mut strings);
        let cmdline_stream = diag::init_stream("<command line>");

        Self {
            strings,
            macros,
            input: InputStack::new(),
            cond_stack: Vec::new(),
            include_dirs: Vec::new(),
            ids,
            cursor: None,
            pushed_back: None,
            line: Vec::new(),
            lookahead: VecDeque::new(),
            output_preprocessed: false,
            verbose: false,
            cmdline_stream,
        }
    }

    /// Release buffers and input state so the context can be reused for
    /// another translation unit. Macro definitions are kept; callers that
    /// want a pristine table build a fresh Preprocessor instead.
    pub fn clear(&mut self) {
        self.lookahead.clear();
        self.line.clear();
        self.cursor = None;
        self.pushed_back = None;
        self.input.clear();
        self.cond_stack.clear();
        self.output_preprocessed = false;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn add_include_dir(&mut self, dir: &str) {
        self.include_dirs.push(dir.to_string());
    }

    /// Open the main input file.
    pub fn push_file(&mut self, path: &Path) -> io::Result<()> {
        self.input.push_file(path)
    }

    /// Use an in-memory buffer as input (stdin, tests).
    pub fn push_buffer(&mut self, name: &str, bytes: Vec<u8>) {
        self.input.push_buffer(name, bytes);
    }

    /// Remove a macro definition by name (-U).
    pub fn undefine(&mut self, name: &str) {
        let id = self.strings.intern(name);
        self.macros.undef(id);
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    // ========================================================================
    // Raw token pulling
    // ========================================================================

    /// Pull the next raw token. End-of-line from the tokenizer becomes
    /// NEWLINE (clearing the cursor); END means end of translation unit.
    fn get_token(&mut self) -> Token {
        if let Some(t) = self.pushed_back.take() {
            return t;
        }

        if self.cursor.is_none() {
            let Some(line) = self.input.next_logical_line() else {
                return Token::end();
            };
            self.cursor = Some(LineCursor::new(line));
        }

        let Some(cur) = self.cursor.as_mut() else {
            return Token::end();
        };
        let t = tokenize(cur, &mut self.strings);
        if t.typ == TokenType::End {
            let pos = cur.pos();
            self.cursor = None;
            return Token::newline(pos);
        }
        t
    }

    fn unread(&mut self, t: Token) {
        debug_assert!(self.pushed_back.is_none());
        self.pushed_back = Some(t);
    }

    fn last_line_pos(&self) -> Position {
        self.line
            .last()
            .map(|t| t.pos)
            .unwrap_or_else(|| self.input.current_pos())
    }

    // ========================================================================
    // Line assembly
    // ========================================================================

    /// A function-like macro name has just been pushed. Read its argument
    /// list onto the line, balancing parentheses. NEWLINE tokens inside
    /// the invocation are skipped, which is how an invocation spanning
    /// physical lines becomes one contiguous line.
    fn read_macro_invocation(&mut self, name: StringId) -> PpResult<()> {
        let t = self.get_token();
        if !t.is_special(LPAREN) {
            // an identifier without '(' is not an invocation; hand the
            // token back to the normal line scan
            self.unread(t);
            return Ok(());
        }
        self.line.push(t);

        let mut nesting = 1;
        while nesting > 0 {
            let t = self.get_token();
            match t.typ {
                TokenType::Newline => continue,
                TokenType::End => {
                    return Err(PpError::raise(
                        PpErrorKind::UnbalancedInvocation,
                        format!(
                            "unbalanced invocation of macro '{}'",
                            self.strings.get(name)
                        ),
                        self.last_line_pos(),
                    ));
                }
                _ => {}
            }
            if t.is_special(LPAREN) {
                nesting += 1;
            }
            if t.is_special(RPAREN) {
                nesting -= 1;
            }
            self.line.push(t);
        }
        Ok(())
    }

    /// Replace `defined NAME` / `defined ( NAME )` with a literal 0 or 1.
    /// The replacement is re-tokenized so it enters the line as a
    /// PREP_NUMBER like any other constant.
    fn read_defined_operator(&mut self) -> PpResult<()> {
        let mut is_parens = false;
        let mut t = self.get_token();
        if t.is_special(LPAREN) {
            t = self.get_token();
            is_parens = true;
        }

        let name = match t.ident() {
            Some(id) if t.is_expandable => id,
            _ => {
                return Err(PpError::raise(
                    PpErrorKind::BadDefined,
                    format!(
                        "expected identifier in 'defined' clause, but got '{}'",
                        show_token(&t, &self.strings)
                    ),
                    t.pos,
                ));
            }
        };

        let literal = if self.macros.is_defined(name) { "1" } else { "0" };
        let mut cur = LineCursor::synthetic(literal, t.pos);
        let tok = tokenize(&mut cur, &mut self.strings);
        self.line.push(tok);

        if is_parens {
            let t = self.get_token();
            if !t.is_special(RPAREN) {
                return Err(PpError::raise(
                    PpErrorKind::BadDefined,
                    "expected ')' to close 'defined' clause",
                    t.pos,
                ));
            }
        }
        Ok(())
    }

    /// Read tokens until NEWLINE, building one complete logical line. For
    /// directives the leading name token is stored verbatim and `defined`
    /// interception is enabled only for #if/#elif. Function-like macro
    /// names trigger invocation reading so multi-line calls are joined.
    /// Returns the number of macro names seen.
    fn read_complete_line(&mut self, first: Token, directive: bool) -> PpResult<usize> {
        let mut expandable = true;
        let mut macros_seen = 0;
        let mut t = first;

        if directive {
            expandable = t.is_keyword(Keyword::If) || t.ident() == Some(self.ids.elif);
            self.line.push(t);
            t = self.get_token();
        }

        while t.typ != TokenType::Newline {
            if t.typ == TokenType::End {
                // input ended without a final newline
                let pos = self.last_line_pos();
                self.line.push(Token::newline(pos));
                return Ok(macros_seen);
            }

            if expandable && t.is_expandable {
                let name = t.ident().unwrap_or_default();
                if directive && name == self.ids.defined {
                    self.read_defined_operator()?;
                } else {
                    match self.macros.kind_of(name) {
                        Some(kind) => {
                            macros_seen += 1;
                            self.line.push(t);
                            if kind == MacroKind::FunctionLike {
                                self.read_macro_invocation(name)?;
                            }
                        }
                        None => self.line.push(t),
                    }
                }
            } else {
                self.line.push(t);
            }
            t = self.get_token();
        }

        self.line.push(t);
        Ok(macros_seen)
    }

    /// Token at position i of the line, pulling more input (and dropping
    /// the trailing NEWLINE) when i runs past the end. NEWLINE from the
    /// input is skipped so invocations keep joining across lines.
    fn skip_or_get_token(&mut self, i: usize) -> Token {
        if i + 1 == self.line.len() && self.line[i].typ == TokenType::Newline {
            self.line.pop();
        }

        if i == self.line.len() {
            let t = loop {
                let t = self.get_token();
                if t.typ != TokenType::Newline {
                    break t;
                }
            };
            if t.typ != TokenType::End {
                self.line.push(t.clone());
            }
            t
        } else {
            self.line[i].clone()
        }
    }

    /// Make sure the function-like invocation starting after position
    /// `start - 1` is completely present in the line, reading more input
    /// if its parentheses are still open. Returns tokens consumed.
    fn skip_or_read_expansion(&mut self, start: usize, name: StringId) -> PpResult<usize> {
        let mut i = start;
        let t = self.skip_or_get_token(i);
        i += 1;
        if !t.is_special(LPAREN) {
            return Ok(i - start);
        }

        let mut nesting = 1;
        while nesting > 0 {
            let t = self.skip_or_get_token(i);
            if t.typ == TokenType::End {
                return Err(PpError::raise(
                    PpErrorKind::UnbalancedInvocation,
                    format!(
                        "unbalanced invocation of macro '{}'",
                        self.strings.get(name)
                    ),
                    self.last_line_pos(),
                ));
            }
            i += 1;
            if t.is_special(LPAREN) {
                nesting += 1;
            }
            if t.is_special(RPAREN) {
                nesting -= 1;
            }
        }
        Ok(i - start)
    }

    /// After an expansion pass, pull whatever input is needed so every
    /// function-like macro still in the line has its whole argument list
    /// present, and make sure the line again ends with a NEWLINE. Returns
    /// the number of function-like macros awaiting expansion.
    fn refill_expanding_line(&mut self) -> PpResult<usize> {
        let len = self.line.len();
        if len == 0 {
            return Ok(0);
        }

        let mut pending = 0;
        let mut i = 0;
        let mut ends_with_newline = false;
        while i < len {
            let t = self.line[i].clone();
            ends_with_newline = t.typ == TokenType::Newline;
            if t.is_expandable {
                if let Some(name) = t.ident() {
                    if !t.is_no_expand(name)
                        && self.macros.kind_of(name) == Some(MacroKind::FunctionLike)
                    {
                        pending += 1;
                        i += self.skip_or_read_expansion(i + 1, name)?;
                    }
                }
            }
            i += 1;
        }

        // complete the line so directives never get mixed in
        if !ends_with_newline {
            let t = self.get_token();
            if t.typ == TokenType::End {
                self.line.push(Token::newline(self.last_line_pos()));
            } else {
                pending += self.read_complete_line(t, false)?;
            }
        }
        Ok(pending)
    }

    // ========================================================================
    // Post-processing into the lookahead
    // ========================================================================

    /// Last step before the parser sees a token: convert preprocessing
    /// forms and merge adjacent string literals. In -E mode tokens pass
    /// through verbatim.
    fn add_to_lookahead(&mut self, t: Token) {
        let mut t = t;

        if !self.output_preprocessed {
            match t.typ {
                TokenType::PrepNumber => {
                    t = convert::convert_preprocessing_number(&t, &self.strings)
                }
                TokenType::PrepChar => t = convert::convert_preprocessing_char(&t, &self.strings),
                TokenType::PrepString => {
                    t = convert::convert_preprocessing_string(&t, &mut self.strings)
                }
                _ => {}
            }

            if t.typ == TokenType::String
                && self
                    .lookahead
                    .back()
                    .is_some_and(|b| b.typ == TokenType::String)
            {
                let added = t.text().unwrap_or_default();
                if let Some(back) = self.lookahead.back_mut() {
                    let merged = self.strings.concat(back.text().unwrap_or_default(), added);
                    back.value = crate::token::lexer::TokenValue::Text(merged);
                }
                if self.verbose {
                    eprintln!("   token( merged string literal )");
                }
                return;
            }
        }

        if self.verbose {
            eprintln!("   token( {} )", show_token(&t, &self.strings));
        }
        self.lookahead.push_back(t);
    }

    /// The lookahead can satisfy a demand of n tokens unless its last
    /// element is a STRING, which a following literal could still merge
    /// into.
    fn is_lookahead_ready(&self, n: usize) -> bool {
        if self.lookahead.len() < n {
            return false;
        }
        if !self.output_preprocessed {
            if let Some(back) = self.lookahead.back() {
                if back.typ == TokenType::String {
                    return false;
                }
            }
        }
        true
    }

    // ========================================================================
    // Top-level line driver
    // ========================================================================

    /// Consume whole lines until the lookahead holds at least n tokens.
    /// At end of input, remaining slots are padded with END.
    fn preprocess_line(&mut self, n: usize) -> PpResult<()> {
        loop {
            let t = self.get_token();
            if t.typ == TokenType::End {
                self.line.clear();
                self.report_unterminated_conditionals();
                break;
            }
            self.line.clear();

            if t.is_special(HASH) {
                let t = self.get_token();
                let conditional = t.is_keyword(Keyword::If)
                    || t.is_keyword(Keyword::Else)
                    || t.ident().is_some_and(|id| {
                        id == self.ids.ifdef
                            || id == self.ids.ifndef
                            || id == self.ids.elif
                            || id == self.ids.endif
                    });
                if (t.typ != TokenType::Newline && self.in_active_block()) || conditional {
                    self.read_complete_line(t, true)?;
                    let line = std::mem::take(&mut self.line);
                    self.preprocess_directive(&line)?;
                } else {
                    // inactive non-conditional directive: drop the line
                    self.cursor = None;
                }
            } else if t.ident() == Some(self.ids.pragma_op) {
                // _Pragma at line start goes through the directive
                // evaluator, which discards it
                self.read_complete_line(t, true)?;
                let line = std::mem::take(&mut self.line);
                self.preprocess_directive(&line)?;
            } else if self.in_active_block() {
                let mut macros_seen = self.read_complete_line(t, false)?;
                while macros_seen > 0 && self.macros.expand(&mut self.line, &mut self.strings) {
                    macros_seen = self.refill_expanding_line()?;
                }
                let line = std::mem::take(&mut self.line);
                for tok in line {
                    if tok.typ != TokenType::Newline || self.output_preprocessed {
                        self.add_to_lookahead(tok);
                    }
                }
            } else {
                // ordinary line in a skipped block
                self.cursor = None;
            }

            if self.is_lookahead_ready(n) {
                break;
            }
        }

        while self.lookahead.len() < n {
            self.add_to_lookahead(Token::end());
        }
        Ok(())
    }

    // ========================================================================
    // Parser-facing API
    // ========================================================================

    /// Pop the next post-processed token.
    pub fn next(&mut self) -> PpResult<Token> {
        if self.lookahead.is_empty() {
            self.preprocess_line(1)?;
        }
        Ok(self.lookahead.pop_front().unwrap_or_else(Token::end))
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> PpResult<Token> {
        self.peek_at(1)
    }

    /// Look at the n-th (1-based) upcoming token without consuming.
    pub fn peek_at(&mut self, n: usize) -> PpResult<Token> {
        debug_assert!(n >= 1);
        if self.lookahead.len() < n {
            self.preprocess_line(n)?;
        }
        Ok(self.lookahead.get(n - 1).cloned().unwrap_or_else(Token::end))
    }

    /// Pop the next token, which must have the given kind.
    pub fn consume(&mut self, typ: TokenType) -> PpResult<Token> {
        let t = self.next()?;
        if t.typ != typ {
            let expected = match typ {
                TokenType::Ident => "identifier",
                TokenType::Number => "number",
                TokenType::String => "string",
                other => crate::token::lexer::token_type_name(other),
            };
            return Err(PpError::raise(
                PpErrorKind::UnexpectedToken,
                format!(
                    "unexpected token '{}', expected {}",
                    show_token(&t, &self.strings),
                    expected
                ),
                t.pos,
            ));
        }
        Ok(t)
    }

    /// Pop the next token, which must be the given punctuator.
    pub fn consume_special(&mut self, code: u32) -> PpResult<Token> {
        let t = self.next()?;
        if !t.is_special(code) {
            let expected = Token::special(code, Position::none());
            return Err(PpError::raise(
                PpErrorKind::UnexpectedToken,
                format!(
                    "unexpected token '{}', expected '{}'",
                    show_token(&t, &self.strings),
                    token_spelling(&expected, &self.strings)
                ),
                t.pos,
            ));
        }
        Ok(t)
    }

    /// Run a synthetic source line through the full pipeline. Used by the
    /// driver for -D command line definitions. END tokens padded in at
    /// the end of the line are stripped so later real input is not cut
    /// off.
    pub fn inject_line(&mut self, text: &str) -> PpResult<()> {
        debug_assert!(self.cursor.is_none());
        self.cursor = Some(LineCursor::synthetic(
            text,
            Position::new(self.cmdline_stream, 1),
        ));
        self.preprocess_line(0)?;
        while self
            .lookahead
            .back()
            .is_some_and(|t| t.typ == TokenType::End)
        {
            self.lookahead.pop_back();
        }
        self.cursor = None;
        Ok(())
    }

    /// -E mode: write the preprocessed token stream as text. String
    /// merging and conversions are disabled, NEWLINE tokens become line
    /// breaks, and each token is indented by its recorded whitespace.
    pub fn preprocess(&mut self, output: &mut impl Write) -> PpResult<()> {
        self.output_preprocessed = true;
        loop {
            let t = self.next()?;
            match t.typ {
                TokenType::End => break,
                TokenType::Newline => {
                    writeln!(output)?;
                }
                _ => {
                    if t.leading_whitespace > 0 {
                        write!(output, "{:1$}", "", t.leading_whitespace as usize)?;
                    }
                    write!(output, "{}", token_spelling(&t, &self.strings))?;
                }
            }
        }
        output.flush()?;
        Ok(())
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
