//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Conversion of raw preprocessing tokens to typed tokens
//
// PREP_NUMBER becomes a NUMBER with value, width and signedness per the
// C99 lexical rules (LP64); PREP_CHAR becomes a NUMBER carrying the
// character value; PREP_STRING becomes a STRING with escapes decoded.
// Conversion runs at the lookahead boundary, after all macro expansion.
//

use crate::diag::{self, Position};
use crate::strings::StringTable;
use crate::token::lexer::{IntKind, NumberValue, Token, TokenType, TokenValue};

// ============================================================================
// Integer suffix / width selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IntSuffix {
    unsigned: bool,
    longs: u8, // 0, 1 or 2
}

fn parse_int_suffix(s: &str) -> Option<IntSuffix> {
    let mut unsigned = false;
    let mut longs: u8 = 0;
    let mut seen_u = false;
    let mut seen_l = false;
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'u' | b'U' => {
                if seen_u {
                    return None;
                }
                seen_u = true;
                unsigned = true;
                i += 1;
            }
            b'l' | b'L' => {
                if seen_l {
                    return None;
                }
                seen_l = true;
                longs = 1;
                if i + 1 < bytes.len() && bytes[i + 1] == bytes[i] {
                    longs = 2;
                    i += 1;
                }
                i += 1;
            }
            _ => return None,
        }
    }
    Some(IntSuffix { unsigned, longs })
}

fn fits(kind: IntKind, value: u64) -> bool {
    match kind {
        IntKind::Int => value <= i32::MAX as u64,
        IntKind::Unsigned => value <= u32::MAX as u64,
        IntKind::Long | IntKind::LongLong => value <= i64::MAX as u64,
        IntKind::UnsignedLong | IntKind::UnsignedLongLong => true,
    }
}

/// Candidate kinds for an integer constant, per C99 6.4.4.1: decimal
/// constants never silently become unsigned; octal and hex may.
fn int_kind(value: u64, suffix: IntSuffix, decimal: bool, pos: Position) -> IntKind {
    use IntKind::*;
    let candidates: &[IntKind] = match (suffix.unsigned, suffix.longs, decimal) {
        (false, 0, true) => &[Int, Long, LongLong],
        (false, 0, false) => &[Int, Unsigned, Long, UnsignedLong, LongLong, UnsignedLongLong],
        (false, 1, true) => &[Long, LongLong],
        (false, 1, false) => &[Long, UnsignedLong, LongLong, UnsignedLongLong],
        (false, 2, true) => &[LongLong],
        (false, 2, false) => &[LongLong, UnsignedLongLong],
        (true, 0, _) => &[Unsigned, UnsignedLong, UnsignedLongLong],
        (true, 1, _) => &[UnsignedLong, UnsignedLongLong],
        (true, 2, _) => &[UnsignedLongLong],
        (_, 3_u8..=u8::MAX, _) => unreachable!("longs is always 0, 1, or 2"),
    };
    for &k in candidates {
        if fits(k, value) {
            return k;
        }
    }
    diag::warning(pos, "integer constant is so large that it is unsigned");
    UnsignedLongLong
}

// ============================================================================
// Number parsing
// ============================================================================

fn digit_value(b: u8, radix: u64) -> Option<u64> {
    let v = match b {
        b'0'..=b'9' => (b - b'0') as u64,
        b'a'..=b'f' => (b - b'a') as u64 + 10,
        b'A'..=b'F' => (b - b'A') as u64 + 10,
        _ => return None,
    };
    if v < radix {
        Some(v)
    } else {
        None
    }
}

fn parse_int(s: &str, pos: Position) -> Result<NumberValue, String> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return Err("empty integer constant".to_string());
    }
    let (radix, start) = if s.starts_with("0x") || s.starts_with("0X") {
        (16u64, 2)
    } else if bytes[0] == b'0' && bytes.len() > 1 {
        (8u64, 1)
    } else {
        (10u64, 0)
    };

    if radix == 16 && bytes.len() == 2 {
        return Err(format!("invalid integer constant '{}'", s));
    }

    let mut value: u64 = 0;
    let mut overflow = false;
    let mut i = start;
    while i < bytes.len() {
        let Some(d) = digit_value(bytes[i], radix) else {
            break;
        };
        let (v, o1) = value.overflowing_mul(radix);
        let (v, o2) = v.overflowing_add(d);
        overflow |= o1 | o2;
        value = v;
        i += 1;
    }
    if overflow {
        diag::warning(pos, &format!("integer constant '{}' is out of range", s));
        value = u64::MAX;
    }
    if i == start && radix != 8 {
        return Err(format!("invalid integer constant '{}'", s));
    }

    let Some(suffix) = parse_int_suffix(&s[i..]) else {
        return Err(format!("invalid integer constant '{}'", s));
    };

    let kind = int_kind(value, suffix, radix == 10, pos);
    Ok(NumberValue::Int { value, kind })
}

/// Hexadecimal floating constant: 0x h-digits [. h-digits] p[±]exp
fn parse_hex_float(s: &str) -> Option<f64> {
    let body = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    let p = body.find(['p', 'P'])?;
    let (mant, exp) = body.split_at(p);
    let exp: i32 = exp[1..].parse().ok()?;

    let (int_part, frac_part) = match mant.find('.') {
        Some(dot) => (&mant[..dot], &mant[dot + 1..]),
        None => (mant, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value = 0f64;
    for b in int_part.bytes() {
        value = value * 16.0 + digit_value(b, 16)? as f64;
    }
    let mut scale = 1.0 / 16.0;
    for b in frac_part.bytes() {
        value += digit_value(b, 16)? as f64 * scale;
        scale /= 16.0;
    }
    Some(value * 2f64.powi(exp))
}

fn parse_float(s: &str) -> Result<NumberValue, String> {
    let (body, suffix) = match s.as_bytes().last() {
        Some(b'f' | b'F') => (&s[..s.len() - 1], Some('f')),
        Some(b'l' | b'L') => (&s[..s.len() - 1], Some('l')),
        _ => (s, None),
    };

    let value: f64 = if body.starts_with("0x") || body.starts_with("0X") {
        parse_hex_float(body).ok_or_else(|| format!("invalid floating constant '{}'", s))?
    } else {
        body.parse()
            .map_err(|_| format!("invalid floating constant '{}'", s))?
    };

    Ok(match suffix {
        Some('f') => NumberValue::Float(value as f32),
        Some('l') => NumberValue::LongDouble(value),
        _ => NumberValue::Double(value),
    })
}

fn is_float_spelling(s: &str) -> bool {
    if s.starts_with("0x") || s.starts_with("0X") {
        s.contains(['.', 'p', 'P'])
    } else {
        s.contains(['.', 'e', 'E'])
    }
}

fn parse_number(s: &str, pos: Position) -> Result<NumberValue, String> {
    if is_float_spelling(s) {
        parse_float(s)
    } else {
        parse_int(s, pos)
    }
}

/// Convert a PREP_NUMBER to a typed NUMBER token. Malformed constants are
/// reported and yield integer zero so preprocessing can continue.
pub fn convert_preprocessing_number(t: &Token, strings: &StringTable) -> Token {
    let Some(id) = t.text() else {
        return t.clone();
    };
    let spelling = strings.get(id);
    let value = match parse_number(spelling, t.pos) {
        Ok(v) => v,
        Err(msg) => {
            diag::error(t.pos, &msg);
            NumberValue::Int {
                value: 0,
                kind: IntKind::Int,
            }
        }
    };

    let mut out = t.clone();
    out.typ = TokenType::Number;
    out.value = TokenValue::Number(value);
    out
}

// ============================================================================
// Escape sequences
// ============================================================================

/// Decode the escape sequences of a char/string literal body.
fn decode_escapes(body: &str, pos: Position) -> String {
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b as char);
            i += 1;
            continue;
        }
        i += 1;
        if i >= bytes.len() {
            out.push('\\');
            break;
        }
        let e = bytes[i];
        i += 1;
        match e {
            b'n' => out.push('\n'),
            b't' => out.push('\t'),
            b'r' => out.push('\r'),
            b'v' => out.push('\x0B'),
            b'f' => out.push('\x0C'),
            b'b' => out.push('\x08'),
            b'a' => out.push('\x07'),
            b'\\' => out.push('\\'),
            b'\'' => out.push('\''),
            b'"' => out.push('"'),
            b'?' => out.push('?'),
            b'0'..=b'7' => {
                let mut v = (e - b'0') as u32;
                let mut n = 1;
                while n < 3 && i < bytes.len() && (b'0'..=b'7').contains(&bytes[i]) {
                    v = v * 8 + (bytes[i] - b'0') as u32;
                    i += 1;
                    n += 1;
                }
                out.push(char::from_u32(v).unwrap_or('\0'));
            }
            b'x' => {
                let mut v: u32 = 0;
                let mut any = false;
                while i < bytes.len() {
                    let Some(d) = digit_value(bytes[i], 16) else {
                        break;
                    };
                    v = (v << 4) | d as u32;
                    i += 1;
                    any = true;
                }
                if !any {
                    diag::warning(pos, "\\x used with no following hex digits");
                    out.push('x');
                } else {
                    out.push(char::from_u32(v & 0xFF).unwrap_or('\0'));
                }
            }
            other => {
                diag::warning(pos, &format!("unknown escape sequence '\\{}'", other as char));
                out.push(other as char);
            }
        }
    }
    out
}

/// Strip an optional encoding prefix and the surrounding quote characters
/// from a raw literal spelling.
fn literal_body(raw: &str, quote: char) -> &str {
    let raw = raw.strip_prefix('L').unwrap_or(raw);
    raw.strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .unwrap_or(raw)
}

/// Convert a PREP_CHAR to a NUMBER carrying the character value. A
/// multi-character constant folds bytes high-to-low, matching the common
/// implementation-defined behavior.
pub fn convert_preprocessing_char(t: &Token, strings: &StringTable) -> Token {
    let Some(id) = t.text() else {
        return t.clone();
    };
    let raw = strings.get(id);
    let body = decode_escapes(literal_body(raw, '\''), t.pos);

    let mut value: u32 = 0;
    let mut count = 0;
    for c in body.chars() {
        value = (value << 8) | (c as u32 & 0xFF);
        count += 1;
    }
    if count == 0 {
        diag::error(t.pos, "empty character constant");
    } else if count > 1 {
        diag::warning(t.pos, "multi-character character constant");
    }

    let mut out = t.clone();
    out.typ = TokenType::Number;
    out.value = TokenValue::Number(NumberValue::Int {
        value: value as u64,
        kind: IntKind::Int,
    });
    out
}

/// Convert a PREP_STRING to a STRING whose text is the decoded body.
pub fn convert_preprocessing_string(t: &Token, strings: &mut StringTable) -> Token {
    let Some(id) = t.text() else {
        return t.clone();
    };
    let raw = strings.get(id).to_string();
    let body = decode_escapes(literal_body(&raw, '"'), t.pos);
    let body_id = strings.intern(&body);

    let mut out = t.clone();
    out.typ = TokenType::String;
    out.value = TokenValue::Text(body_id);
    out
}

// ============================================================================
// Constant values for #if evaluation
// ============================================================================

/// Integer value of a pp-number spelling inside a controlling expression.
/// Floating constants are not valid there.
pub fn int_const_value(s: &str, pos: Position) -> Option<i64> {
    match parse_number(s, pos) {
        Ok(NumberValue::Int { value, .. }) => Some(value as i64),
        _ => None,
    }
}

/// Value of a character constant inside a controlling expression.
pub fn char_const_value(raw: &str, pos: Position) -> i64 {
    let body = decode_escapes(literal_body(raw, '\''), pos);
    let mut value: u32 = 0;
    for c in body.chars() {
        value = (value << 8) | (c as u32 & 0xFF);
    }
    value as i64
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Position;

    fn num(s: &str) -> NumberValue {
        parse_number(s, Position::none()).unwrap()
    }

    #[test]
    fn test_decimal_int() {
        assert_eq!(
            num("42"),
            NumberValue::Int {
                value: 42,
                kind: IntKind::Int
            }
        );
        assert_eq!(
            num("0"),
            NumberValue::Int {
                value: 0,
                kind: IntKind::Int
            }
        );
    }

    #[test]
    fn test_radix() {
        assert_eq!(
            num("0x1F"),
            NumberValue::Int {
                value: 31,
                kind: IntKind::Int
            }
        );
        assert_eq!(
            num("017"),
            NumberValue::Int {
                value: 15,
                kind: IntKind::Int
            }
        );
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(
            num("1u"),
            NumberValue::Int {
                value: 1,
                kind: IntKind::Unsigned
            }
        );
        assert_eq!(
            num("1L"),
            NumberValue::Int {
                value: 1,
                kind: IntKind::Long
            }
        );
        assert_eq!(
            num("1ull"),
            NumberValue::Int {
                value: 1,
                kind: IntKind::UnsignedLongLong
            }
        );
        assert_eq!(
            num("1LLU"),
            NumberValue::Int {
                value: 1,
                kind: IntKind::UnsignedLongLong
            }
        );
    }

    #[test]
    fn test_width_promotion() {
        // too big for int, decimal promotes to long (LP64)
        assert_eq!(
            num("3000000000"),
            NumberValue::Int {
                value: 3000000000,
                kind: IntKind::Long
            }
        );
        // hex may become unsigned int first
        assert_eq!(
            num("0xFFFFFFFF"),
            NumberValue::Int {
                value: 0xFFFFFFFF,
                kind: IntKind::Unsigned
            }
        );
    }

    #[test]
    fn test_floats() {
        assert_eq!(num("3.5"), NumberValue::Double(3.5));
        assert_eq!(num("1e3"), NumberValue::Double(1000.0));
        assert_eq!(num("2.5f"), NumberValue::Float(2.5));
        assert_eq!(num("2.5L"), NumberValue::LongDouble(2.5));
        // hex float: 0x1p-2 = 0.25
        assert_eq!(num("0x1p-2"), NumberValue::Double(0.25));
        assert_eq!(num("0x1.8p1"), NumberValue::Double(3.0));
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(parse_number("12abc", Position::none()).is_err());
        assert!(parse_number("1uu", Position::none()).is_err());
    }

    #[test]
    fn test_escapes() {
        assert_eq!(decode_escapes("a\\nb", Position::none()), "a\nb");
        assert_eq!(decode_escapes("\\t\\\\\\\"", Position::none()), "\t\\\"");
        assert_eq!(decode_escapes("\\101", Position::none()), "A");
        assert_eq!(decode_escapes("\\x41", Position::none()), "A");
        assert_eq!(decode_escapes("\\0", Position::none()), "\0");
    }

    #[test]
    fn test_char_values() {
        assert_eq!(char_const_value("'a'", Position::none()), 'a' as i64);
        assert_eq!(char_const_value("'\\n'", Position::none()), 10);
        assert_eq!(char_const_value("'\\0'", Position::none()), 0);
        assert_eq!(char_const_value("L'x'", Position::none()), 'x' as i64);
    }

    #[test]
    fn test_int_const_value() {
        assert_eq!(int_const_value("42", Position::none()), Some(42));
        assert_eq!(int_const_value("0x10", Position::none()), Some(16));
        assert_eq!(int_const_value("199901L", Position::none()), Some(199901));
        assert_eq!(int_const_value("3.5", Position::none()), None);
    }

    #[test]
    fn test_convert_string() {
        let mut strings = StringTable::new();
        let raw = strings.intern("\"a\\nb\"");
        let t = Token::with_value(
            TokenType::PrepString,
            Position::none(),
            TokenValue::Text(raw),
        );
        let out = convert_preprocessing_string(&t, &mut strings);
        assert_eq!(out.typ, TokenType::String);
        assert_eq!(strings.get(out.text().unwrap()), "a\nb");
    }

    #[test]
    fn test_convert_char() {
        let mut strings = StringTable::new();
        let raw = strings.intern("'A'");
        let t = Token::with_value(TokenType::PrepChar, Position::none(), TokenValue::Text(raw));
        let out = convert_preprocessing_char(&t, &strings);
        assert_eq!(out.typ, TokenType::Number);
        assert_eq!(
            out.value,
            TokenValue::Number(NumberValue::Int {
                value: 65,
                kind: IntKind::Int
            })
        );
    }
}
