//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Tokenizer for pcpp - C99 preprocessing tokens
//
// Lexes one pp-token per call from a cursor over a single logical line.
// Numbers, character constants and string literals come out in their raw
// preprocessing forms (PrepNumber/PrepChar/PrepString); conversion to typed
// values happens later, in convert.rs, once macro expansion is finished.
//

use crate::diag::Position;
use crate::input::LogicalLine;
use crate::strings::{StringId, StringTable};
use std::collections::HashSet;

// ============================================================================
// Token Types
// ============================================================================

/// Token kinds, from raw preprocessing forms through converted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Ident,
    Keyword,
    PrepNumber,
    PrepChar,
    PrepString,
    Number,
    String,
    Special,
    /// End of a logical line. Never produced by the tokenizer itself; the
    /// puller rewrites end-of-buffer into one of these.
    Newline,
    /// End of the translation unit.
    End,
}

/// Multi-character operators and punctuators.
/// Single characters are stored as their ASCII value; these start at 256.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SpecialToken {
    AddAssign = 256, // +=
    Increment,       // ++
    SubAssign,       // -=
    Decrement,       // --
    Arrow,           // ->
    MulAssign,       // *=
    DivAssign,       // /=
    ModAssign,       // %=
    Lte,             // <=
    Gte,             // >=
    Equal,           // ==
    NotEqual,        // !=
    LogicalAnd,      // &&
    AndAssign,       // &=
    LogicalOr,       // ||
    OrAssign,        // |=
    XorAssign,       // ^=
    HashHash,        // ##
    LeftShift,       // <<
    RightShift,      // >>
    DotDot,          // ..
    ShlAssign,       // <<=
    ShrAssign,       // >>=
    Ellipsis,        // ...
}

impl SpecialToken {
    pub const BASE: u32 = 256;
}

/// C99 reserved words. Keywords are never macro-expandable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Auto,
    Break,
    Case,
    Char,
    Const,
    Continue,
    Default,
    Do,
    Double,
    Else,
    Enum,
    Extern,
    Float,
    For,
    Goto,
    If,
    Inline,
    Int,
    Long,
    Register,
    Restrict,
    Return,
    Short,
    Signed,
    Sizeof,
    Static,
    Struct,
    Switch,
    Typedef,
    Union,
    Unsigned,
    Void,
    Volatile,
    While,
    Bool,
    Complex,
    Imaginary,
}

impl Keyword {
    pub fn from_name(name: &str) -> Option<Keyword> {
        use Keyword::*;
        let kw = match name {
            "auto" => Auto,
            "break" => Break,
            "case" => Case,
            "char" => Char,
            "const" => Const,
            "continue" => Continue,
            "default" => Default,
            "do" => Do,
            "double" => Double,
            "else" => Else,
            "enum" => Enum,
            "extern" => Extern,
            "float" => Float,
            "for" => For,
            "goto" => Goto,
            "if" => If,
            "inline" => Inline,
            "int" => Int,
            "long" => Long,
            "register" => Register,
            "restrict" => Restrict,
            "return" => Return,
            "short" => Short,
            "signed" => Signed,
            "sizeof" => Sizeof,
            "static" => Static,
            "struct" => Struct,
            "switch" => Switch,
            "typedef" => Typedef,
            "union" => Union,
            "unsigned" => Unsigned,
            "void" => Void,
            "volatile" => Volatile,
            "while" => While,
            "_Bool" => Bool,
            "_Complex" => Complex,
            "_Imaginary" => Imaginary,
            _ => return None,
        };
        Some(kw)
    }

    pub fn name(&self) -> &'static str {
        use Keyword::*;
        match self {
            Auto => "auto",
            Break => "break",
            Case => "case",
            Char => "char",
            Const => "const",
            Continue => "continue",
            Default => "default",
            Do => "do",
            Double => "double",
            Else => "else",
            Enum => "enum",
            Extern => "extern",
            Float => "float",
            For => "for",
            Goto => "goto",
            If => "if",
            Inline => "inline",
            Int => "int",
            Long => "long",
            Register => "register",
            Restrict => "restrict",
            Return => "return",
            Short => "short",
            Signed => "signed",
            Sizeof => "sizeof",
            Static => "static",
            Struct => "struct",
            Switch => "switch",
            Typedef => "typedef",
            Union => "union",
            Unsigned => "unsigned",
            Void => "void",
            Volatile => "volatile",
            While => "while",
            Bool => "_Bool",
            Complex => "_Complex",
            Imaginary => "_Imaginary",
        }
    }
}

// ============================================================================
// Converted numeric values
// ============================================================================

/// Width and signedness of a converted integer constant (LP64 model).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntKind {
    Int,
    Unsigned,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
}

impl IntKind {
    pub fn is_signed(&self) -> bool {
        matches!(self, IntKind::Int | IntKind::Long | IntKind::LongLong)
    }

    pub fn bits(&self) -> u32 {
        match self {
            IntKind::Int | IntKind::Unsigned => 32,
            _ => 64,
        }
    }
}

/// Numeric payload of a converted NUMBER token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int { value: u64, kind: IntKind },
    Float(f32),
    Double(f64),
    LongDouble(f64),
}

// ============================================================================
// Token
// ============================================================================

/// Type-specific token payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    /// Identifier name (interned)
    Ident(StringId),
    /// Raw spelling of a PrepNumber/PrepChar/PrepString (quotes included),
    /// or the converted body of a String
    Text(StringId),
    /// Operator/punctuator code
    Special(u32),
    Keyword(Keyword),
    /// Converted numeric value
    Number(NumberValue),
}

/// A preprocessing token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub typ: TokenType,
    pub value: TokenValue,
    /// Whitespace run preceding the token on its line, for -E output
    pub leading_whitespace: u16,
    /// True for identifier tokens, which may name a macro
    pub is_expandable: bool,
    /// Macro names that must not expand at this occurrence. Set on every
    /// token a macro body produces, so an expansion can never re-expand
    /// its own generating macro.
    pub no_expand: Option<HashSet<StringId>>,
    pub pos: Position,
}

impl Token {
    pub fn new(typ: TokenType, pos: Position) -> Self {
        Self {
            typ,
            value: TokenValue::None,
            leading_whitespace: 0,
            is_expandable: false,
            no_expand: None,
            pos,
        }
    }

    pub fn with_value(typ: TokenType, pos: Position, value: TokenValue) -> Self {
        let mut t = Self::new(typ, pos);
        t.is_expandable = typ == TokenType::Ident;
        t.value = value;
        t
    }

    pub fn newline(pos: Position) -> Self {
        Self::new(TokenType::Newline, pos)
    }

    pub fn end() -> Self {
        Self::new(TokenType::End, Position::none())
    }

    pub fn special(code: u32, pos: Position) -> Self {
        Self::with_value(TokenType::Special, pos, TokenValue::Special(code))
    }

    pub fn is_special(&self, code: u32) -> bool {
        matches!(self.value, TokenValue::Special(c) if c == code)
    }

    pub fn special_code(&self) -> Option<u32> {
        match self.value {
            TokenValue::Special(c) => Some(c),
            _ => None,
        }
    }

    pub fn ident(&self) -> Option<StringId> {
        match self.value {
            TokenValue::Ident(id) => Some(id),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<StringId> {
        match self.value {
            TokenValue::Text(id) => Some(id),
            _ => None,
        }
    }

    pub fn keyword(&self) -> Option<Keyword> {
        match self.value {
            TokenValue::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.keyword() == Some(kw)
    }

    /// Forbid expansion of the named macro at this occurrence.
    pub fn mark_no_expand(&mut self, name: StringId) {
        self.no_expand.get_or_insert_with(HashSet::new).insert(name);
    }

    pub fn is_no_expand(&self, name: StringId) -> bool {
        self.no_expand
            .as_ref()
            .is_some_and(|set| set.contains(&name))
    }

    /// Carry another token's disabled-macro set onto this one.
    pub fn inherit_no_expand(&mut self, other: &Token) {
        if let Some(set) = &other.no_expand {
            let own = self.no_expand.get_or_insert_with(HashSet::new);
            own.extend(set.iter().copied());
        }
    }
}

// ============================================================================
// Character Classification
// ============================================================================

const LETTER: u8 = 1;
const DIGIT: u8 = 2;
const EXP: u8 = 8;
const DOT: u8 = 16;
const VALID_SECOND: u8 = 32; // can be the second char of a 2-char operator

fn char_class(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => DIGIT,
        b'E' | b'e' => LETTER | EXP,
        b'P' | b'p' => LETTER | EXP,
        b'A'..=b'D' | b'F'..=b'O' | b'Q'..=b'Z' => LETTER,
        b'a'..=b'd' | b'f'..=b'o' | b'q'..=b'z' => LETTER,
        b'_' => LETTER,
        b'.' => DOT | VALID_SECOND,
        b'=' | b'+' | b'-' | b'>' | b'<' | b'&' | b'|' | b'#' => VALID_SECOND,
        _ => 0,
    }
}

#[inline]
fn is_letter_or_digit(c: u8) -> bool {
    char_class(c) & (LETTER | DIGIT) != 0
}

#[inline]
fn is_digit(c: u8) -> bool {
    char_class(c) & DIGIT != 0
}

// ============================================================================
// Line Cursor
// ============================================================================

/// Mutable cursor over the bytes of one logical line. The cursor being
/// exhausted is what the line assembler rewrites into a NEWLINE token.
#[derive(Debug)]
pub struct LineCursor {
    bytes: Vec<u8>,
    offset: usize,
    pos: Position,
}

impl LineCursor {
    pub fn new(line: LogicalLine) -> Self {
        Self {
            bytes: line.text.into_bytes(),
            offset: 0,
            pos: Position::new(line.stream, line.line),
        }
    }

    /// Cursor over synthetic text, e.g. an injected line or the literal
    /// "0"/"1" replacing a `defined` operator.
    pub fn synthetic(text: &str, pos: Position) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
            offset: 0,
            pos,
        }
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.offset += 1;
        Some(b)
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Lex one preprocessing token, advancing the cursor past it. At end of
/// buffer returns END with the cursor unchanged; NEWLINE is never produced
/// here.
pub fn tokenize(cur: &mut LineCursor, strings: &mut StringTable) -> Token {
    let mut ws: u16 = 0;
    while let Some(b) = cur.peek() {
        match b {
            b' ' | b'\t' | b'\x0B' | b'\x0C' => {
                ws = ws.saturating_add(if b == b'\t' { 8 } else { 1 });
                cur.bump();
            }
            _ => break,
        }
    }

    let Some(first) = cur.bump() else {
        return Token::end();
    };
    let pos = cur.pos();

    let mut t = if is_digit(first) {
        lex_number(cur, strings, pos, first)
    } else if char_class(first) & LETTER != 0 {
        lex_identifier(cur, strings, pos, first)
    } else if first == b'.' && cur.peek().is_some_and(is_digit) {
        lex_number(cur, strings, pos, first)
    } else if first == b'"' {
        lex_literal(cur, strings, pos, b'"', "")
    } else if first == b'\'' {
        lex_literal(cur, strings, pos, b'\'', "")
    } else {
        lex_special(cur, pos, first)
    };

    t.leading_whitespace = ws;
    t
}

/// pp-number: digit | . digit | pp-number (digit|letter|.|e±|E±|p±|P±)
fn lex_number(cur: &mut LineCursor, strings: &mut StringTable, pos: Position, first: u8) -> Token {
    let mut num = String::new();
    num.push(first as char);

    while let Some(b) = cur.peek() {
        let class = char_class(b);
        if class & (DIGIT | LETTER | DOT) == 0 {
            break;
        }
        cur.bump();
        num.push(b as char);
        if class & EXP != 0 {
            if let Some(sign @ (b'+' | b'-')) = cur.peek() {
                cur.bump();
                num.push(sign as char);
            }
        }
    }

    let id = strings.intern(&num);
    Token::with_value(TokenType::PrepNumber, pos, TokenValue::Text(id))
}

fn lex_identifier(
    cur: &mut LineCursor,
    strings: &mut StringTable,
    pos: Position,
    first: u8,
) -> Token {
    let mut name = String::new();
    name.push(first as char);

    while let Some(b) = cur.peek() {
        if !is_letter_or_digit(b) {
            break;
        }
        cur.bump();
        name.push(b as char);
    }

    // L"..." / L'...' wide literals
    if name == "L" {
        if let Some(q @ (b'"' | b'\'')) = cur.peek() {
            cur.bump();
            return lex_literal(cur, strings, pos, q, "L");
        }
    }

    if let Some(kw) = Keyword::from_name(&name) {
        return Token::with_value(TokenType::Keyword, pos, TokenValue::Keyword(kw));
    }

    let id = strings.intern(&name);
    Token::with_value(TokenType::Ident, pos, TokenValue::Ident(id))
}

/// Raw string or character literal, escapes left untouched. The stored
/// spelling keeps prefix and quotes so -E output can reproduce the source.
fn lex_literal(
    cur: &mut LineCursor,
    strings: &mut StringTable,
    pos: Position,
    delim: u8,
    prefix: &str,
) -> Token {
    let mut raw = String::from(prefix);
    raw.push(delim as char);

    let mut terminated = false;
    while let Some(b) = cur.bump() {
        raw.push(b as char);
        if b == b'\\' {
            if let Some(esc) = cur.bump() {
                raw.push(esc as char);
            }
            continue;
        }
        if b == delim {
            terminated = true;
            break;
        }
    }
    if !terminated {
        let what = if delim == b'"' { '"' } else { '\'' };
        crate::diag::warning(pos, &format!("missing terminating {} character", what));
        raw.push(delim as char);
    }

    let typ = if delim == b'"' {
        TokenType::PrepString
    } else {
        TokenType::PrepChar
    };
    let id = strings.intern(&raw);
    Token::with_value(typ, pos, TokenValue::Text(id))
}

fn lex_special(cur: &mut LineCursor, pos: Position, first: u8) -> Token {
    static TWO_CHAR_OPS: &[(u8, u8, u32)] = &[
        (b'+', b'=', SpecialToken::AddAssign as u32),
        (b'+', b'+', SpecialToken::Increment as u32),
        (b'-', b'=', SpecialToken::SubAssign as u32),
        (b'-', b'-', SpecialToken::Decrement as u32),
        (b'-', b'>', SpecialToken::Arrow as u32),
        (b'*', b'=', SpecialToken::MulAssign as u32),
        (b'/', b'=', SpecialToken::DivAssign as u32),
        (b'%', b'=', SpecialToken::ModAssign as u32),
        (b'<', b'=', SpecialToken::Lte as u32),
        (b'>', b'=', SpecialToken::Gte as u32),
        (b'=', b'=', SpecialToken::Equal as u32),
        (b'!', b'=', SpecialToken::NotEqual as u32),
        (b'&', b'&', SpecialToken::LogicalAnd as u32),
        (b'&', b'=', SpecialToken::AndAssign as u32),
        (b'|', b'|', SpecialToken::LogicalOr as u32),
        (b'|', b'=', SpecialToken::OrAssign as u32),
        (b'^', b'=', SpecialToken::XorAssign as u32),
        (b'#', b'#', SpecialToken::HashHash as u32),
        (b'<', b'<', SpecialToken::LeftShift as u32),
        (b'>', b'>', SpecialToken::RightShift as u32),
        (b'.', b'.', SpecialToken::DotDot as u32),
    ];

    if let Some(next) = cur.peek() {
        if char_class(next) & VALID_SECOND != 0 {
            for &(c0, c1, code) in TWO_CHAR_OPS {
                if first == c0 && next == c1 {
                    cur.bump();
                    // three-character operators
                    let third = cur.peek();
                    if code == SpecialToken::LeftShift as u32 && third == Some(b'=') {
                        cur.bump();
                        return Token::special(SpecialToken::ShlAssign as u32, pos);
                    }
                    if code == SpecialToken::RightShift as u32 && third == Some(b'=') {
                        cur.bump();
                        return Token::special(SpecialToken::ShrAssign as u32, pos);
                    }
                    if code == SpecialToken::DotDot as u32 && third == Some(b'.') {
                        cur.bump();
                        return Token::special(SpecialToken::Ellipsis as u32, pos);
                    }
                    return Token::special(code, pos);
                }
            }
        }
    }

    Token::special(first as u32, pos)
}

// ============================================================================
// Display
// ============================================================================

fn show_special(value: u32) -> String {
    if value < SpecialToken::BASE {
        return (value as u8 as char).to_string();
    }
    match value {
        x if x == SpecialToken::AddAssign as u32 => "+=".to_string(),
        x if x == SpecialToken::Increment as u32 => "++".to_string(),
        x if x == SpecialToken::SubAssign as u32 => "-=".to_string(),
        x if x == SpecialToken::Decrement as u32 => "--".to_string(),
        x if x == SpecialToken::Arrow as u32 => "->".to_string(),
        x if x == SpecialToken::MulAssign as u32 => "*=".to_string(),
        x if x == SpecialToken::DivAssign as u32 => "/=".to_string(),
        x if x == SpecialToken::ModAssign as u32 => "%=".to_string(),
        x if x == SpecialToken::Lte as u32 => "<=".to_string(),
        x if x == SpecialToken::Gte as u32 => ">=".to_string(),
        x if x == SpecialToken::Equal as u32 => "==".to_string(),
        x if x == SpecialToken::NotEqual as u32 => "!=".to_string(),
        x if x == SpecialToken::LogicalAnd as u32 => "&&".to_string(),
        x if x == SpecialToken::AndAssign as u32 => "&=".to_string(),
        x if x == SpecialToken::LogicalOr as u32 => "||".to_string(),
        x if x == SpecialToken::OrAssign as u32 => "|=".to_string(),
        x if x == SpecialToken::XorAssign as u32 => "^=".to_string(),
        x if x == SpecialToken::HashHash as u32 => "##".to_string(),
        x if x == SpecialToken::LeftShift as u32 => "<<".to_string(),
        x if x == SpecialToken::RightShift as u32 => ">>".to_string(),
        x if x == SpecialToken::DotDot as u32 => "..".to_string(),
        x if x == SpecialToken::ShlAssign as u32 => "<<=".to_string(),
        x if x == SpecialToken::ShrAssign as u32 => ">>=".to_string(),
        x if x == SpecialToken::Ellipsis as u32 => "...".to_string(),
        _ => format!("<special:{}>", value),
    }
}

/// Re-escape a converted string body for display.
fn escape_string(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

/// The source spelling of a token: what -E emits, and what `#` and `##`
/// operate on.
pub fn token_spelling(token: &Token, strings: &StringTable) -> String {
    match &token.value {
        TokenValue::None => match token.typ {
            TokenType::Newline => "\n".to_string(),
            TokenType::End => "<end>".to_string(),
            _ => String::new(),
        },
        TokenValue::Ident(id) | TokenValue::Text(id) => {
            let s = strings.get_opt(*id).unwrap_or("");
            if token.typ == TokenType::String {
                format!("\"{}\"", escape_string(s))
            } else {
                s.to_string()
            }
        }
        TokenValue::Special(code) => show_special(*code),
        TokenValue::Keyword(kw) => kw.name().to_string(),
        TokenValue::Number(n) => match n {
            NumberValue::Int { value, .. } => value.to_string(),
            NumberValue::Float(f) => format!("{}", f),
            NumberValue::Double(d) => format!("{}", d),
            NumberValue::LongDouble(d) => format!("{}", d),
        },
    }
}

/// Format a token for dumps and diagnostics.
pub fn show_token(token: &Token, strings: &StringTable) -> String {
    match token.typ {
        TokenType::Newline => "<newline>".to_string(),
        TokenType::End => "<end>".to_string(),
        _ => token_spelling(token, strings),
    }
}

pub fn token_type_name(typ: TokenType) -> &'static str {
    match typ {
        TokenType::Ident => "IDENT",
        TokenType::Keyword => "KEYWORD",
        TokenType::PrepNumber => "PREP_NUMBER",
        TokenType::PrepChar => "PREP_CHAR",
        TokenType::PrepString => "PREP_STRING",
        TokenType::Number => "NUMBER",
        TokenType::String => "STRING",
        TokenType::Special => "SPECIAL",
        TokenType::Newline => "NEWLINE",
        TokenType::End => "END",
    }
}

// ============================================================================
// Tests
// ============================================================================
