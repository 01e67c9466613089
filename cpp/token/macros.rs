//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Macro table and expander for pcpp
//
// The table stores definitions with parameter references, `#` and `##`
// already resolved to markers. `expand` rewrites a token line in place,
// one left-to-right pass per call; the line assembler keeps calling it
// (refilling the line in between) until no substitution happens.
//
// Hygiene: every token a macro body produces carries the generating
// macro's name in its no_expand set, so a macro whose expansion mentions
// itself never loops. Argument tokens keep their own sets untouched,
// which is what lets nested invocations like MAX(MAX(a,b),c) expand.
//

use crate::diag::{self, Position};
use crate::strings::{StringId, StringTable};
use crate::token::lexer::{
    token_spelling, tokenize, LineCursor, Token, TokenType, TokenValue,
};
use std::collections::HashMap;

const LPAREN: u32 = b'(' as u32;
const RPAREN: u32 = b')' as u32;
const COMMA: u32 = b',' as u32;

// ============================================================================
// Macro Definition
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    ObjectLike,
    FunctionLike,
}

/// One element of a macro replacement list.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplToken {
    /// Plain token copied to the expansion
    Token(Token),
    /// Parameter reference, substituted with the raw argument tokens
    Param(usize),
    /// `#param`: the argument's spelling as a string literal
    Stringify(usize),
    /// `##`: join the neighboring tokens' spellings and re-tokenize
    Paste,
    /// `__VA_ARGS__`: the trailing arguments, comma separated
    VaArgs,
}

/// Macros whose replacement depends on the expansion site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinMacro {
    File,
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub name: StringId,
    pub kind: MacroKind,
    pub params: Vec<StringId>,
    pub is_variadic: bool,
    pub body: Vec<ReplToken>,
    pub builtin: Option<BuiltinMacro>,
}

impl Macro {
    pub fn object(name: StringId, body: Vec<ReplToken>) -> Self {
        Self {
            name,
            kind: MacroKind::ObjectLike,
            params: Vec::new(),
            is_variadic: false,
            body,
            builtin: None,
        }
    }

    pub fn function(
        name: StringId,
        params: Vec<StringId>,
        is_variadic: bool,
        body: Vec<ReplToken>,
    ) -> Self {
        Self {
            name,
            kind: MacroKind::FunctionLike,
            params,
            is_variadic,
            body,
            builtin: None,
        }
    }

    fn builtin(name: StringId, builtin: BuiltinMacro) -> Self {
        Self {
            name,
            kind: MacroKind::ObjectLike,
            params: Vec::new(),
            is_variadic: false,
            body: Vec::new(),
            builtin: Some(builtin),
        }
    }
}

// ============================================================================
// Macro Table
// ============================================================================

const DEFAULT_MACRO_CAPACITY: usize = 64;

#[derive(Debug, Default)]
pub struct MacroTable {
    map: HashMap<StringId, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self {
            map: HashMap::with_capacity(DEFAULT_MACRO_CAPACITY),
        }
    }

    /// Seed the definitions every translation unit starts with.
    pub fn seed_builtins(&mut self, strings: &mut StringTable) {
        self.define(predefined(strings, "__STDC__", "1"));
        self.define(predefined(strings, "__STDC_VERSION__", "199901L"));
        self.define(predefined(strings, "__STDC_HOSTED__", "1"));

        let file = strings.intern("__FILE__");
        self.define(Macro::builtin(file, BuiltinMacro::File));
        let line = strings.intern("__LINE__");
        self.define(Macro::builtin(line, BuiltinMacro::Line));
    }

    pub fn define(&mut self, mac: Macro) {
        self.map.insert(mac.name, mac);
    }

    pub fn undef(&mut self, name: StringId) {
        self.map.remove(&name);
    }

    pub fn lookup(&self, name: StringId) -> Option<&Macro> {
        self.map.get(&name)
    }

    pub fn is_defined(&self, name: StringId) -> bool {
        self.map.contains_key(&name)
    }

    pub fn kind_of(&self, name: StringId) -> Option<MacroKind> {
        self.map.get(&name).map(|m| m.kind)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    // ------------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------------

    /// Rewrite `line` in place, substituting macro invocations left to
    /// right. Returns true iff any substitution occurred. A function-like
    /// invocation whose closing parenthesis lies beyond the line is left
    /// untouched; the caller pulls more input and calls again.
    pub fn expand(&self, line: &mut Vec<Token>, strings: &mut StringTable) -> bool {
        let mut changed = false;
        let mut i = 0;

        while i < line.len() {
            let t = &line[i];
            if !t.is_expandable {
                i += 1;
                continue;
            }
            let name = match t.ident() {
                Some(id) => id,
                None => {
                    i += 1;
                    continue;
                }
            };
            if t.is_no_expand(name) {
                i += 1;
                continue;
            }
            let Some(def) = self.map.get(&name) else {
                i += 1;
                continue;
            };

            if let Some(builtin) = def.builtin {
                let repl = builtin_replacement(builtin, &line[i], strings);
                line.splice(i..i + 1, repl);
                changed = true;
                continue;
            }

            match def.kind {
                MacroKind::ObjectLike => {
                    let inv = line[i].clone();
                    let repl = substitute(def, &[], &inv, strings);
                    line.splice(i..i + 1, repl);
                    changed = true;
                }
                MacroKind::FunctionLike => {
                    if !line.get(i + 1).is_some_and(|n| n.is_special(LPAREN)) {
                        // no argument list here: an identifier alone is
                        // not an invocation
                        i += 1;
                        continue;
                    }
                    let Some((args, close)) = collect_args(line, i + 1) else {
                        i += 1;
                        continue;
                    };
                    check_arity(def, &args, &line[i], strings);
                    let inv = line[i].clone();
                    let repl = substitute(def, &args, &inv, strings);
                    line.splice(i..=close, repl);
                    changed = true;
                }
            }
        }

        changed
    }
}

/// Build a predefined object-like macro whose body is one pp-number.
fn predefined(strings: &mut StringTable, name: &str, value: &str) -> Macro {
    let name = strings.intern(name);
    let text = strings.intern(value);
    let tok = Token::with_value(
        TokenType::PrepNumber,
        Position::none(),
        TokenValue::Text(text),
    );
    Macro::object(name, vec![ReplToken::Token(tok)])
}

fn builtin_replacement(builtin: BuiltinMacro, inv: &Token, strings: &mut StringTable) -> Vec<Token> {
    let (typ, spelling) = match builtin {
        BuiltinMacro::File => (
            TokenType::PrepString,
            format!("\"{}\"", diag::stream_name(inv.pos.stream)),
        ),
        BuiltinMacro::Line => (TokenType::PrepNumber, inv.pos.line.to_string()),
    };
    let id = strings.intern(&spelling);
    let mut t = Token::with_value(typ, inv.pos, TokenValue::Text(id));
    t.leading_whitespace = inv.leading_whitespace;
    vec![t]
}

// ============================================================================
// Argument collection
// ============================================================================

/// Collect the arguments of a function-like invocation whose `(` sits at
/// `open`. Commas at nesting depth 1 separate arguments. Returns the
/// argument lists and the index of the matching `)`, or None when the
/// closing parenthesis is not on this line.
fn collect_args(line: &[Token], open: usize) -> Option<(Vec<Vec<Token>>, usize)> {
    let mut args: Vec<Vec<Token>> = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut depth = 1;
    let mut j = open + 1;

    while j < line.len() {
        let t = &line[j];
        if matches!(t.typ, TokenType::Newline | TokenType::End) {
            return None;
        }
        if t.is_special(LPAREN) {
            depth += 1;
            current.push(t.clone());
        } else if t.is_special(RPAREN) {
            depth -= 1;
            if depth == 0 {
                if !current.is_empty() || !args.is_empty() {
                    args.push(current);
                }
                return Some((args, j));
            }
            current.push(t.clone());
        } else if t.is_special(COMMA) && depth == 1 {
            args.push(current);
            current = Vec::new();
        } else {
            current.push(t.clone());
        }
        j += 1;
    }

    None
}

fn check_arity(def: &Macro, args: &[Vec<Token>], inv: &Token, strings: &StringTable) {
    let given = args.len();
    let wanted = def.params.len();
    let ok = if def.is_variadic {
        given >= wanted
    } else {
        given == wanted || (wanted == 1 && given == 0)
    };
    if !ok {
        let name = inv
            .ident()
            .and_then(|id| strings.get_opt(id))
            .unwrap_or("")
            .to_string();
        diag::error(
            inv.pos,
            &format!(
                "macro '{}' requires {} arguments, but {} given",
                name, wanted, given
            ),
        );
    }
}

// ============================================================================
// Substitution
// ============================================================================

/// Substitute one invocation. Body tokens land with the generating macro's
/// name in their no_expand set; argument tokens are spliced raw so later
/// passes can still expand them.
fn substitute(def: &Macro, args: &[Vec<Token>], inv: &Token, strings: &mut StringTable) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::new();
    let body = &def.body;
    let mut i = 0;

    while i < body.len() {
        let prev_was_paste = i > 0 && matches!(body[i - 1], ReplToken::Paste);

        match &body[i] {
            ReplToken::Paste => {
                i += 1;
                continue;
            }
            ReplToken::Token(t) => {
                let mut tok = t.clone();
                tok.pos = inv.pos;
                tok.mark_no_expand(def.name);
                tok.inherit_no_expand(inv);
                if prev_was_paste && !result.is_empty() {
                    paste_onto(&mut result, &[tok], def, inv, strings);
                } else {
                    result.push(tok);
                }
            }
            ReplToken::Param(idx) => {
                let arg = splice_arg(args.get(*idx), inv);
                if prev_was_paste && !result.is_empty() {
                    paste_onto(&mut result, &arg, def, inv, strings);
                } else {
                    result.extend(arg);
                }
            }
            ReplToken::Stringify(idx) => {
                let empty = Vec::new();
                let arg = args.get(*idx).unwrap_or(&empty);
                let text = stringify(arg, strings);
                let id = strings.intern(&text);
                let mut tok =
                    Token::with_value(TokenType::PrepString, inv.pos, TokenValue::Text(id));
                tok.leading_whitespace = 1;
                if prev_was_paste && !result.is_empty() {
                    paste_onto(&mut result, &[tok], def, inv, strings);
                } else {
                    result.push(tok);
                }
            }
            ReplToken::VaArgs => {
                let rest = if args.len() > def.params.len() {
                    &args[def.params.len()..]
                } else {
                    &[]
                };
                let empty = rest.iter().all(|a| a.is_empty());

                if prev_was_paste && empty {
                    // GNU `, ## __VA_ARGS__`: swallow the comma
                    if result.last().is_some_and(|t| t.is_special(COMMA)) {
                        result.pop();
                    }
                    i += 1;
                    continue;
                }

                for (k, arg) in rest.iter().enumerate() {
                    if k > 0 {
                        let mut comma = Token::special(COMMA, inv.pos);
                        comma.mark_no_expand(def.name);
                        result.push(comma);
                    }
                    let spliced = splice_arg(Some(arg), inv);
                    if k == 0 && prev_was_paste && !result.is_empty() {
                        paste_onto(&mut result, &spliced, def, inv, strings);
                    } else {
                        result.extend(spliced);
                    }
                }
            }
        }

        i += 1;
    }

    if let Some(first) = result.first_mut() {
        first.leading_whitespace = inv.leading_whitespace;
    }
    result
}

/// Clone argument tokens for splicing, repositioned at the invocation.
fn splice_arg(arg: Option<&Vec<Token>>, inv: &Token) -> Vec<Token> {
    let Some(arg) = arg else {
        return Vec::new();
    };
    arg.iter()
        .map(|t| {
            let mut tok = t.clone();
            tok.pos = inv.pos;
            tok.inherit_no_expand(inv);
            tok
        })
        .collect()
}

/// Join the last produced token with the first of `next` by re-tokenizing
/// their concatenated spellings; remaining tokens of `next` follow as-is.
fn paste_onto(
    result: &mut Vec<Token>,
    next: &[Token],
    def: &Macro,
    inv: &Token,
    strings: &mut StringTable,
) {
    if next.is_empty() {
        return;
    }
    let Some(prev) = result.pop() else {
        result.extend(next.iter().cloned());
        return;
    };

    let combined = format!(
        "{}{}",
        token_spelling(&prev, strings),
        token_spelling(&next[0], strings)
    );

    let mut cur = LineCursor::synthetic(&combined, inv.pos);
    let mut pasted = Vec::new();
    loop {
        let t = tokenize(&mut cur, strings);
        if t.typ == TokenType::End {
            break;
        }
        pasted.push(t);
    }
    if pasted.len() != 1 {
        diag::warning(
            inv.pos,
            &format!("pasting formed '{}', an invalid preprocessing token", combined),
        );
    }
    if let Some(first) = pasted.first_mut() {
        first.leading_whitespace = prev.leading_whitespace;
    }
    for t in &mut pasted {
        t.pos = inv.pos;
        t.mark_no_expand(def.name);
        t.inherit_no_expand(inv);
    }

    result.extend(pasted);
    result.extend(next.iter().skip(1).cloned());
}

/// `#arg`: the argument's spelling as a string literal, single spaces
/// between tokens, `\` and `"` escaped (C99 6.10.3.2).
fn stringify(arg: &[Token], strings: &StringTable) -> String {
    let mut out = String::from("\"");
    for (k, t) in arg.iter().enumerate() {
        if k > 0 && t.leading_whitespace > 0 {
            out.push(' ');
        }
        for c in token_spelling(t, strings).chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
    }
    out.push('"');
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Position;

    fn lex_line(src: &str, strings: &mut StringTable) -> Vec<Token> {
        let mut cur = LineCursor::synthetic(src, Position::new(0, 1));
        let mut out = Vec::new();
        loop {
            let t = tokenize(&mut cur, strings);
            if t.typ == TokenType::End {
                break;
            }
            out.push(t);
        }
        out.push(Token::newline(Position::new(0, 1)));
        out
    }

    fn spellings(line: &[Token], strings: &StringTable) -> Vec<String> {
        line.iter()
            .filter(|t| t.typ != TokenType::Newline)
            .map(|t| token_spelling(t, strings))
            .collect()
    }

    /// Lex a replacement list, turning parameter names into markers.
    fn body_of(src: &str, params: &[StringId], strings: &mut StringTable) -> Vec<ReplToken> {
        let toks = lex_line(src, strings);
        let mut body = Vec::new();
        for t in toks {
            if t.typ == TokenType::Newline {
                break;
            }
            if t.is_special(crate::token::lexer::SpecialToken::HashHash as u32) {
                body.push(ReplToken::Paste);
                continue;
            }
            if let Some(id) = t.ident() {
                if let Some(idx) = params.iter().position(|&p| p == id) {
                    body.push(ReplToken::Param(idx));
                    continue;
                }
            }
            body.push(ReplToken::Token(t));
        }
        body
    }

    #[test]
    fn test_object_like() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("X");
        let body = body_of("42", &[], &mut strings);
        table.define(Macro::object(name, body));

        let mut line = lex_line("a X b", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        assert_eq!(spellings(&line, &strings), vec!["a", "42", "b"]);
        assert!(!table.expand(&mut line, &mut strings));
    }

    #[test]
    fn test_function_like() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("ADD");
        let a = strings.intern("a");
        let b = strings.intern("b");
        let body = body_of("a+b", &[a, b], &mut strings);
        table.define(Macro::function(name, vec![a, b], false, body));

        let mut line = lex_line("x = ADD(1, 2);", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        assert_eq!(
            spellings(&line, &strings),
            vec!["x", "=", "1", "+", "2", ";"]
        );
    }

    #[test]
    fn test_function_like_without_parens() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("F");
        let body = body_of("1", &[], &mut strings);
        table.define(Macro::function(name, vec![], false, body));

        let mut line = lex_line("F + 1", &mut strings);
        assert!(!table.expand(&mut line, &mut strings));
        assert_eq!(spellings(&line, &strings), vec!["F", "+", "1"]);
    }

    #[test]
    fn test_self_reference_stops() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("F");
        let x = strings.intern("x");
        // F(x) -> F(x+1): the produced F must not expand again
        let body = body_of("F(x+1)", &[x], &mut strings);
        table.define(Macro::function(name, vec![x], false, body));

        let mut line = lex_line("F(0)", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        assert_eq!(
            spellings(&line, &strings),
            vec!["F", "(", "0", "+", "1", ")"]
        );
        // and the line is stable from here on
        assert!(!table.expand(&mut line, &mut strings));
    }

    #[test]
    fn test_nested_invocation_in_argument() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("MAX");
        let a = strings.intern("a");
        let b = strings.intern("b");
        let body = body_of("((a)>(b)?(a):(b))", &[a, b], &mut strings);
        table.define(Macro::function(name, vec![a, b], false, body));

        let mut line = lex_line("MAX( MAX(10,12), 20 )", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        let text = spellings(&line, &strings).join("");
        assert_eq!(text, "((((10)>(12)?(10):(12)))>(20)?(((10)>(12)?(10):(12))):(20))");
    }

    #[test]
    fn test_stringify() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("STR");
        let x = strings.intern("x");
        table.define(Macro::function(
            name,
            vec![x],
            false,
            vec![ReplToken::Stringify(0)],
        ));

        let mut line = lex_line("STR(a + b)", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        assert_eq!(spellings(&line, &strings), vec!["\"a + b\""]);
    }

    #[test]
    fn test_stringify_escapes_quotes() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("STR");
        let x = strings.intern("x");
        table.define(Macro::function(
            name,
            vec![x],
            false,
            vec![ReplToken::Stringify(0)],
        ));

        let mut line = lex_line("STR(\"hi\")", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        assert_eq!(spellings(&line, &strings), vec!["\"\\\"hi\\\"\""]);
    }

    #[test]
    fn test_paste() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("GLUE");
        let a = strings.intern("a");
        let b = strings.intern("b");
        table.define(Macro::function(
            name,
            vec![a, b],
            false,
            vec![ReplToken::Param(0), ReplToken::Paste, ReplToken::Param(1)],
        ));

        let mut line = lex_line("GLUE(var, 123)", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        assert_eq!(spellings(&line, &strings), vec!["var123"]);
    }

    #[test]
    fn test_partial_invocation_left_alone() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("ADD");
        let a = strings.intern("a");
        let b = strings.intern("b");
        let body = body_of("a+b", &[a, b], &mut strings);
        table.define(Macro::function(name, vec![a, b], false, body));

        // closing paren is beyond this line
        let mut line = lex_line("ADD(1,", &mut strings);
        assert!(!table.expand(&mut line, &mut strings));
        assert_eq!(spellings(&line, &strings), vec!["ADD", "(", "1", ","]);
    }

    #[test]
    fn test_collect_args_nesting() {
        let mut strings = StringTable::new();
        let line = lex_line("(f(a,b), c)", &mut strings);
        let (args, close) = collect_args(&line, 0).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(spellings(&args[0], &strings), vec!["f", "(", "a", ",", "b", ")"]);
        assert_eq!(spellings(&args[1], &strings), vec!["c"]);
        assert!(line[close].is_special(RPAREN));
    }

    #[test]
    fn test_empty_argument_list() {
        let mut strings = StringTable::new();
        let line = lex_line("()", &mut strings);
        let (args, _) = collect_args(&line, 0).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_varargs() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("LIST");
        table.define(Macro::function(
            name,
            vec![],
            true,
            vec![ReplToken::VaArgs],
        ));

        let mut line = lex_line("LIST(1, 2, 3)", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        assert_eq!(spellings(&line, &strings), vec!["1", ",", "2", ",", "3"]);
    }

    #[test]
    fn test_builtin_line() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        table.seed_builtins(&mut strings);

        let mut line = lex_line("__LINE__", &mut strings);
        assert!(table.expand(&mut line, &mut strings));
        assert_eq!(spellings(&line, &strings), vec!["1"]);
    }

    #[test]
    fn test_undef() {
        let mut strings = StringTable::new();
        let mut table = MacroTable::new();
        let name = strings.intern("X");
        table.define(Macro::object(name, body_of("1", &[], &mut strings)));
        assert!(table.is_defined(name));
        table.undef(name);
        assert!(!table.is_defined(name));

        let mut line = lex_line("X", &mut strings);
        assert!(!table.expand(&mut line, &mut strings));
    }
}
