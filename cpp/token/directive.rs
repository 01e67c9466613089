//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Directive evaluation for pcpp
//
// Consumes assembled directive lines ('#' already stripped, trailing
// NEWLINE included) and mutates the macro table, the conditional stack
// and the input stack. Controlling expressions of #if/#elif arrive with
// `defined` already replaced by 0/1; remaining macros are expanded here
// and leftover identifiers evaluate to zero.
//

use crate::diag::{self, Position, PpError, PpErrorKind, PpResult};
use crate::strings::{StringId, StringTable};
use crate::token::convert;
use crate::token::lexer::{
    Keyword, NumberValue, SpecialToken, Token, TokenType, TokenValue,
};
use crate::token::macros::{Macro, MacroKind, ReplToken};
use crate::token::preprocess::Preprocessor;
use std::path::PathBuf;

const LPAREN: u32 = b'(' as u32;
const RPAREN: u32 = b')' as u32;
const COMMA: u32 = b',' as u32;
const HASH: u32 = b'#' as u32;

const MAX_INCLUDE_DEPTH: usize = 200;

// ============================================================================
// Conditional Compilation State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CondState {
    /// This branch is selected; tokens flow
    Active,
    /// No branch selected yet; a later #elif/#else may activate
    Skipping,
    /// A branch was already taken (or the enclosing block is inactive)
    Done,
}

#[derive(Debug, Clone)]
pub(crate) struct Conditional {
    state: CondState,
    seen_else: bool,
    pub(crate) pos: Position,
}

impl Preprocessor {
    /// True when the current #if/#ifdef nesting selects the current line.
    pub fn in_active_block(&self) -> bool {
        self.cond_stack
            .last()
            .map(|c| c.state == CondState::Active)
            .unwrap_or(true)
    }

    fn push_conditional(&mut self, state: CondState, pos: Position) {
        self.cond_stack.push(Conditional {
            state,
            seen_else: false,
            pos,
        });
    }

    // ========================================================================
    // Directive dispatch
    // ========================================================================

    /// Evaluate one assembled directive line.
    pub(crate) fn preprocess_directive(&mut self, line: &[Token]) -> PpResult<()> {
        let toks: &[Token] = match line.last() {
            Some(t) if t.typ == TokenType::Newline => &line[..line.len() - 1],
            _ => line,
        };
        // '#' on its own is the null directive
        let Some(first) = toks.first() else {
            return Ok(());
        };
        let rest = &toks[1..];
        let pos = first.pos;

        if first.is_keyword(Keyword::If) {
            return self.directive_if(rest, pos);
        }
        if first.is_keyword(Keyword::Else) {
            return self.directive_else(pos);
        }
        // line markers ("# 1 file") emitted by other preprocessors
        if first.typ == TokenType::PrepNumber {
            return self.directive_line(toks, pos);
        }

        let Some(name) = first.ident() else {
            if self.in_active_block() {
                diag::warning(pos, "invalid preprocessor directive");
            }
            return Ok(());
        };

        if name == self.ids.ifdef {
            return self.directive_ifdef(rest, false, pos);
        }
        if name == self.ids.ifndef {
            return self.directive_ifdef(rest, true, pos);
        }
        if name == self.ids.elif {
            return self.directive_elif(rest, pos);
        }
        if name == self.ids.endif {
            return self.directive_endif(pos);
        }

        // everything below only runs inside an active block
        if !self.in_active_block() {
            return Ok(());
        }

        if name == self.ids.define {
            self.directive_define(rest, pos);
            return Ok(());
        }
        if name == self.ids.undef {
            self.directive_undef(rest, pos);
            return Ok(());
        }
        if name == self.ids.include {
            return self.directive_include(rest, pos);
        }
        if name == self.ids.error {
            let text = self.spell_tokens(rest);
            return Err(PpError::raise(
                PpErrorKind::Directive,
                format!("#error {}", text.trim()),
                pos,
            ));
        }
        if name == self.ids.warning {
            let text = self.spell_tokens(rest);
            diag::warning(pos, &format!("#warning {}", text.trim()));
            return Ok(());
        }
        if name == self.ids.line {
            return self.directive_line(rest, pos);
        }
        if name == self.ids.pragma || name == self.ids.pragma_op {
            // pragmas carry no meaning here; discard the line
            return Ok(());
        }

        diag::warning(
            pos,
            &format!(
                "unknown preprocessor directive #{}",
                self.strings.get_opt(name).unwrap_or("")
            ),
        );
        Ok(())
    }

    fn spell_tokens(&self, toks: &[Token]) -> String {
        let mut out = String::new();
        for t in toks {
            if !out.is_empty() && t.leading_whitespace > 0 {
                out.push(' ');
            }
            out.push_str(&crate::token::lexer::token_spelling(t, &self.strings));
        }
        out
    }

    // ========================================================================
    // Conditionals
    // ========================================================================

    fn directive_if(&mut self, rest: &[Token], pos: Position) -> PpResult<()> {
        if !self.in_active_block() {
            self.push_conditional(CondState::Done, pos);
            return Ok(());
        }
        let state = if self.eval_controlling_expr(rest, pos) {
            CondState::Active
        } else {
            CondState::Skipping
        };
        self.push_conditional(state, pos);
        Ok(())
    }

    fn directive_ifdef(&mut self, rest: &[Token], negate: bool, pos: Position) -> PpResult<()> {
        if !self.in_active_block() {
            self.push_conditional(CondState::Done, pos);
            return Ok(());
        }
        let defined = match rest.first().and_then(|t| t.ident()) {
            Some(id) => self.macros.is_defined(id),
            None => {
                let which = if negate { "#ifndef" } else { "#ifdef" };
                diag::error(pos, &format!("expected identifier after {}", which));
                false
            }
        };
        let state = if defined != negate {
            CondState::Active
        } else {
            CondState::Skipping
        };
        self.push_conditional(state, pos);
        Ok(())
    }

    fn directive_elif(&mut self, rest: &[Token], pos: Position) -> PpResult<()> {
        let Some(top) = self.cond_stack.last() else {
            diag::error(pos, "#elif without #if");
            return Ok(());
        };
        if top.seen_else {
            diag::error(pos, "#elif after #else");
            return Ok(());
        }
        let new_state = match top.state {
            CondState::Active | CondState::Done => CondState::Done,
            CondState::Skipping => {
                if self.eval_controlling_expr(rest, pos) {
                    CondState::Active
                } else {
                    CondState::Skipping
                }
            }
        };
        if let Some(top) = self.cond_stack.last_mut() {
            top.state = new_state;
        }
        Ok(())
    }

    fn directive_else(&mut self, pos: Position) -> PpResult<()> {
        let Some(top) = self.cond_stack.last_mut() else {
            diag::error(pos, "#else without #if");
            return Ok(());
        };
        if top.seen_else {
            diag::error(pos, "duplicate #else");
            return Ok(());
        }
        top.seen_else = true;
        top.state = match top.state {
            CondState::Active | CondState::Done => CondState::Done,
            CondState::Skipping => CondState::Active,
        };
        Ok(())
    }

    fn directive_endif(&mut self, pos: Position) -> PpResult<()> {
        if self.cond_stack.pop().is_none() {
            diag::error(pos, "#endif without #if");
        }
        Ok(())
    }

    /// Expand and evaluate the controlling expression of #if/#elif.
    fn eval_controlling_expr(&mut self, toks: &[Token], pos: Position) -> bool {
        if toks.is_empty() {
            diag::error(pos, "#if with no expression");
            return false;
        }
        let mut line: Vec<Token> = toks.to_vec();
        while self.macros.expand(&mut line, &mut self.strings) {}

        let mut eval = IfExpr {
            toks: &line,
            i: 0,
            strings: &self.strings,
            pos,
        };
        eval.expr_cond() != 0
    }

    // ========================================================================
    // Definitions
    // ========================================================================

    fn directive_define(&mut self, rest: &[Token], pos: Position) {
        let Some(name_tok) = rest.first() else {
            diag::error(pos, "no macro name given in #define directive");
            return;
        };
        let Some(name) = name_tok.ident() else {
            diag::error(name_tok.pos, "macro name must be an identifier");
            return;
        };

        let mut params: Vec<StringId> = Vec::new();
        let mut is_variadic = false;
        let mut kind = MacroKind::ObjectLike;
        let mut body_start = 1;

        // '(' with no preceding whitespace opens a parameter list
        if rest.len() > 1 && rest[1].is_special(LPAREN) && rest[1].leading_whitespace == 0 {
            kind = MacroKind::FunctionLike;
            match parse_param_list(&rest[2..], name_tok.pos) {
                Some((list, variadic, consumed)) => {
                    params = list;
                    is_variadic = variadic;
                    body_start = 2 + consumed;
                }
                None => return,
            }
        }

        let body = self.build_replacement_list(&rest[body_start..], &params, kind, is_variadic);
        let mac = match kind {
            MacroKind::ObjectLike => Macro::object(name, body),
            MacroKind::FunctionLike => Macro::function(name, params, is_variadic, body),
        };

        if let Some(old) = self.macros.lookup(name) {
            if *old != mac {
                diag::warning(
                    name_tok.pos,
                    &format!("'{}' macro redefined", self.strings.get(name)),
                );
            }
        }
        self.macros.define(mac);
    }

    /// Turn a replacement list into stored form: parameter references,
    /// `#param` and `##` become markers.
    fn build_replacement_list(
        &mut self,
        toks: &[Token],
        params: &[StringId],
        kind: MacroKind,
        is_variadic: bool,
    ) -> Vec<ReplToken> {
        let mut body = Vec::new();
        let mut k = 0;

        while k < toks.len() {
            let t = &toks[k];

            if t.is_special(SpecialToken::HashHash as u32) {
                if body.is_empty() || k + 1 == toks.len() {
                    diag::error(t.pos, "'##' cannot appear at either end of a macro expansion");
                } else {
                    body.push(ReplToken::Paste);
                }
                k += 1;
                continue;
            }

            if kind == MacroKind::FunctionLike && t.is_special(HASH) {
                let param = toks
                    .get(k + 1)
                    .and_then(|n| n.ident())
                    .and_then(|id| params.iter().position(|&p| p == id));
                match param {
                    Some(idx) => {
                        body.push(ReplToken::Stringify(idx));
                        k += 2;
                    }
                    None => {
                        diag::error(t.pos, "'#' is not followed by a macro parameter");
                        k += 1;
                    }
                }
                continue;
            }

            if let Some(id) = t.ident() {
                if let Some(idx) = params.iter().position(|&p| p == id) {
                    body.push(ReplToken::Param(idx));
                    k += 1;
                    continue;
                }
                if id == self.ids.va_args {
                    if is_variadic {
                        body.push(ReplToken::VaArgs);
                    } else {
                        diag::error(t.pos, "__VA_ARGS__ can only appear in a variadic macro");
                    }
                    k += 1;
                    continue;
                }
            }

            let mut tok = t.clone();
            tok.no_expand = None;
            body.push(ReplToken::Token(tok));
            k += 1;
        }

        body
    }

    fn directive_undef(&mut self, rest: &[Token], pos: Position) {
        match rest.first().and_then(|t| t.ident()) {
            Some(id) => self.macros.undef(id),
            None => diag::error(pos, "no macro name given in #undef directive"),
        }
    }

    // ========================================================================
    // Includes and line control
    // ========================================================================

    fn directive_include(&mut self, rest: &[Token], pos: Position) -> PpResult<()> {
        if self.input.depth() >= MAX_INCLUDE_DEPTH {
            return Err(PpError::raise(
                PpErrorKind::Directive,
                "#include nested too deeply",
                pos,
            ));
        }

        let (name, quoted) = match rest.first() {
            Some(t) if t.typ == TokenType::PrepString => {
                let raw = self.strings.get(t.text().unwrap_or_default());
                let name = raw.trim_matches('"').to_string();
                (name, true)
            }
            Some(t) if t.is_special(b'<' as u32) => {
                let mut name = String::new();
                let mut closed = false;
                for t in &rest[1..] {
                    if t.is_special(b'>' as u32) {
                        closed = true;
                        break;
                    }
                    name.push_str(&crate::token::lexer::token_spelling(t, &self.strings));
                }
                if !closed {
                    return Err(PpError::raise(
                        PpErrorKind::Directive,
                        "missing terminating '>' in #include",
                        pos,
                    ));
                }
                (name, false)
            }
            _ => {
                return Err(PpError::raise(
                    PpErrorKind::Directive,
                    "expected a file name after #include",
                    pos,
                ));
            }
        };

        let mut candidates: Vec<PathBuf> = Vec::new();
        if quoted {
            candidates.push(self.input.current_dir().join(&name));
        }
        for dir in &self.include_dirs {
            candidates.push(PathBuf::from(dir).join(&name));
        }

        for path in &candidates {
            if path.is_file() {
                return self.input.push_file(path).map_err(|e| {
                    PpError::raise(
                        PpErrorKind::Directive,
                        format!("{}: {}", path.display(), e),
                        pos,
                    )
                });
            }
        }

        Err(PpError::raise(
            PpErrorKind::Directive,
            format!("{}: no such file or directory", name),
            pos,
        ))
    }

    fn directive_line(&mut self, rest: &[Token], pos: Position) -> PpResult<()> {
        let Some(number) = rest.first().filter(|t| t.typ == TokenType::PrepNumber) else {
            diag::error(pos, "#line requires a line number");
            return Ok(());
        };
        let spelling = self.strings.get(number.text().unwrap_or_default());
        let Some(n) = convert::int_const_value(spelling, pos).filter(|&n| n >= 0) else {
            diag::error(pos, "invalid line number in #line directive");
            return Ok(());
        };

        let file = rest
            .get(1)
            .filter(|t| t.typ == TokenType::PrepString)
            .and_then(|t| t.text())
            .map(|id| self.strings.get(id).trim_matches('"').to_string());

        self.input.set_line_override(n as u32, file.as_deref());
        Ok(())
    }

    /// Called at end of input: conditionals still open are an error.
    pub(crate) fn report_unterminated_conditionals(&mut self) {
        for c in self.cond_stack.drain(..) {
            diag::error(c.pos, "unterminated #if block");
        }
    }
}

fn parse_param_list(
    toks: &[Token],
    pos: Position,
) -> Option<(Vec<StringId>, bool, usize)> {
    let mut params = Vec::new();
    let mut is_variadic = false;
    let mut expect_name = true;
    let mut k = 0;

    loop {
        let Some(t) = toks.get(k) else {
            diag::error(pos, "missing ')' in macro parameter list");
            return None;
        };
        if t.is_special(RPAREN) {
            k += 1;
            break;
        }
        if expect_name {
            if let Some(id) = t.ident() {
                params.push(id);
                expect_name = false;
            } else if t.is_special(SpecialToken::Ellipsis as u32) {
                is_variadic = true;
                expect_name = false;
            } else {
                diag::error(pos, "invalid token in macro parameter list");
                return None;
            }
        } else if t.is_special(COMMA) {
            if is_variadic {
                diag::error(pos, "parameters may not follow '...'");
                return None;
            }
            expect_name = true;
        } else {
            diag::error(pos, "expected ',' or ')' in macro parameter list");
            return None;
        }
        k += 1;
    }

    Some((params, is_variadic, k))
}

// ============================================================================
// #if expression evaluation
// ============================================================================

/// Precedence-climbing evaluator over the expanded controlling expression.
/// All arithmetic is i64; division and shift amounts are guarded rather
/// than trapped.
struct IfExpr<'a> {
    toks: &'a [Token],
    i: usize,
    strings: &'a StringTable,
    pos: Position,
}

impl<'a> IfExpr<'a> {
    fn current(&self) -> Option<&Token> {
        self.toks.get(self.i).filter(|t| t.typ != TokenType::Newline)
    }

    fn advance(&mut self) {
        self.i += 1;
    }

    fn is_special(&self, code: u32) -> bool {
        self.current().is_some_and(|t| t.is_special(code))
    }

    fn expr_cond(&mut self) -> i64 {
        let cond = self.expr_or();
        if !self.is_special(b'?' as u32) {
            return cond;
        }
        self.advance();
        let then_val = self.expr_cond();
        if self.is_special(b':' as u32) {
            self.advance();
        } else {
            diag::error(self.pos, "missing ':' in preprocessor expression");
        }
        let else_val = self.expr_cond();
        if cond != 0 {
            then_val
        } else {
            else_val
        }
    }

    fn expr_or(&mut self) -> i64 {
        let mut left = self.expr_and();
        while self.is_special(SpecialToken::LogicalOr as u32) {
            self.advance();
            let right = self.expr_and();
            left = (left != 0 || right != 0) as i64;
        }
        left
    }

    fn expr_and(&mut self) -> i64 {
        let mut left = self.expr_bitor();
        while self.is_special(SpecialToken::LogicalAnd as u32) {
            self.advance();
            let right = self.expr_bitor();
            left = (left != 0 && right != 0) as i64;
        }
        left
    }

    fn expr_bitor(&mut self) -> i64 {
        let mut left = self.expr_bitxor();
        while self.is_special(b'|' as u32) {
            self.advance();
            left |= self.expr_bitxor();
        }
        left
    }

    fn expr_bitxor(&mut self) -> i64 {
        let mut left = self.expr_bitand();
        while self.is_special(b'^' as u32) {
            self.advance();
            left ^= self.expr_bitand();
        }
        left
    }

    fn expr_bitand(&mut self) -> i64 {
        let mut left = self.expr_equality();
        while self.is_special(b'&' as u32) {
            self.advance();
            left &= self.expr_equality();
        }
        left
    }

    fn expr_equality(&mut self) -> i64 {
        let mut left = self.expr_relational();
        loop {
            if self.is_special(SpecialToken::Equal as u32) {
                self.advance();
                left = (left == self.expr_relational()) as i64;
            } else if self.is_special(SpecialToken::NotEqual as u32) {
                self.advance();
                left = (left != self.expr_relational()) as i64;
            } else {
                return left;
            }
        }
    }

    fn expr_relational(&mut self) -> i64 {
        let mut left = self.expr_shift();
        loop {
            if self.is_special(b'<' as u32) {
                self.advance();
                left = (left < self.expr_shift()) as i64;
            } else if self.is_special(b'>' as u32) {
                self.advance();
                left = (left > self.expr_shift()) as i64;
            } else if self.is_special(SpecialToken::Lte as u32) {
                self.advance();
                left = (left <= self.expr_shift()) as i64;
            } else if self.is_special(SpecialToken::Gte as u32) {
                self.advance();
                left = (left >= self.expr_shift()) as i64;
            } else {
                return left;
            }
        }
    }

    fn expr_shift(&mut self) -> i64 {
        let mut left = self.expr_additive();
        loop {
            if self.is_special(SpecialToken::LeftShift as u32) {
                self.advance();
                let right = self.expr_additive();
                left = left.wrapping_shl((right & 63) as u32);
            } else if self.is_special(SpecialToken::RightShift as u32) {
                self.advance();
                let right = self.expr_additive();
                left = left.wrapping_shr((right & 63) as u32);
            } else {
                return left;
            }
        }
    }

    fn expr_additive(&mut self) -> i64 {
        let mut left = self.expr_multiplicative();
        loop {
            if self.is_special(b'+' as u32) {
                self.advance();
                left = left.wrapping_add(self.expr_multiplicative());
            } else if self.is_special(b'-' as u32) {
                self.advance();
                left = left.wrapping_sub(self.expr_multiplicative());
            } else {
                return left;
            }
        }
    }

    fn expr_multiplicative(&mut self) -> i64 {
        let mut left = self.expr_unary();
        loop {
            if self.is_special(b'*' as u32) {
                self.advance();
                left = left.wrapping_mul(self.expr_unary());
            } else if self.is_special(b'/' as u32) {
                self.advance();
                let right = self.expr_unary();
                if right != 0 {
                    left = left.wrapping_div(right);
                } else {
                    diag::error(self.pos, "division by zero in preprocessor expression");
                    left = 0;
                }
            } else if self.is_special(b'%' as u32) {
                self.advance();
                let right = self.expr_unary();
                if right != 0 {
                    left = left.wrapping_rem(right);
                } else {
                    diag::error(self.pos, "division by zero in preprocessor expression");
                    left = 0;
                }
            } else {
                return left;
            }
        }
    }

    fn expr_unary(&mut self) -> i64 {
        if self.is_special(b'!' as u32) {
            self.advance();
            return (self.expr_unary() == 0) as i64;
        }
        if self.is_special(b'~' as u32) {
            self.advance();
            return !self.expr_unary();
        }
        if self.is_special(b'-' as u32) {
            self.advance();
            return self.expr_unary().wrapping_neg();
        }
        if self.is_special(b'+' as u32) {
            self.advance();
            return self.expr_unary();
        }
        self.expr_primary()
    }

    fn expr_primary(&mut self) -> i64 {
        if self.is_special(LPAREN) {
            self.advance();
            let v = self.expr_cond();
            if self.is_special(RPAREN) {
                self.advance();
            } else {
                diag::error(self.pos, "missing ')' in preprocessor expression");
            }
            return v;
        }

        let Some(t) = self.current() else {
            diag::error(self.pos, "missing operand in preprocessor expression");
            return 0;
        };

        match t.typ {
            TokenType::PrepNumber => {
                let spelling = self
                    .strings
                    .get_opt(t.text().unwrap_or_default())
                    .unwrap_or("");
                let v = convert::int_const_value(spelling, t.pos);
                if v.is_none() {
                    diag::error(
                        t.pos,
                        "floating constant in preprocessor expression",
                    );
                }
                self.advance();
                v.unwrap_or(0)
            }
            TokenType::PrepChar => {
                let spelling = self
                    .strings
                    .get_opt(t.text().unwrap_or_default())
                    .unwrap_or("'\\0'")
                    .to_string();
                self.advance();
                convert::char_const_value(&spelling, self.pos)
            }
            TokenType::Number => {
                let v = match t.value {
                    TokenValue::Number(NumberValue::Int { value, .. }) => value as i64,
                    _ => 0,
                };
                self.advance();
                v
            }
            // any identifier surviving expansion is undefined: value 0
            TokenType::Ident => {
                self.advance();
                0
            }
            _ => {
                diag::error(
                    t.pos,
                    "token is not valid in a preprocessor expression",
                );
                self.advance();
                0
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag;

    fn eval(src: &str) -> i64 {
        diag::clear_streams();
        let mut strings = StringTable::new();
        let mut cur =
            crate::token::lexer::LineCursor::synthetic(src, Position::new(0, 1));
        let mut toks = Vec::new();
        loop {
            let t = crate::token::lexer::tokenize(&mut cur, &mut strings);
            if t.typ == TokenType::End {
                break;
            }
            toks.push(t);
        }
        let mut e = IfExpr {
            toks: &toks,
            i: 0,
            strings: &strings,
            pos: Position::none(),
        };
        e.expr_cond()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), 7);
        assert_eq!(eval("(1 + 2) * 3"), 9);
        assert_eq!(eval("10 / 3"), 3);
        assert_eq!(eval("10 % 3"), 1);
        assert_eq!(eval("-4 + 2"), -2);
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(eval("1 < 2"), 1);
        assert_eq!(eval("2 <= 1"), 0);
        assert_eq!(eval("1 == 1 && 2 != 3"), 1);
        assert_eq!(eval("0 || 0"), 0);
        assert_eq!(eval("!0"), 1);
    }

    #[test]
    fn test_ternary() {
        assert_eq!(eval("1 ? 10 : 20"), 10);
        assert_eq!(eval("0 ? 10 : 20"), 20);
        assert_eq!(eval("1 ? 0 ? 1 : 2 : 3"), 2);
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(eval("1 << 4"), 16);
        assert_eq!(eval("255 >> 4"), 15);
        assert_eq!(eval("0xF0 | 0x0F"), 255);
        assert_eq!(eval("0xFF & 0x0F"), 15);
        assert_eq!(eval("0xFF ^ 0x0F"), 0xF0);
        assert_eq!(eval("~0"), -1);
    }

    #[test]
    fn test_radix_and_char() {
        assert_eq!(eval("0x10 + 010"), 24);
        assert_eq!(eval("'A'"), 65);
        assert_eq!(eval("199901L >= 199901"), 1);
    }

    #[test]
    fn test_undefined_ident_is_zero() {
        assert_eq!(eval("FOO"), 0);
        assert_eq!(eval("FOO + 1"), 1);
    }

    #[test]
    fn test_division_by_zero_guarded() {
        assert_eq!(eval("1 / 0"), 0);
        assert_eq!(eval("1 % 0"), 0);
    }
}
