//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Macro expansion tests: object-like, function-like across lines,
// stringification, token pasting, variadics, hygiene.
//

use crate::common::{token_stream, token_stream_with_args, token_texts};

#[test]
fn object_like_macro() {
    let got = token_stream("#define X 42\nint a = X;\n");
    let expected = vec![
        ("KEYWORD", "int"),
        ("IDENT", "a"),
        ("SPECIAL", "="),
        ("NUMBER", "42"),
        ("SPECIAL", ";"),
    ];
    let got: Vec<(&str, &str)> = got
        .iter()
        .map(|(k, t)| (k.as_str(), t.as_str()))
        .collect();
    assert_eq!(got, expected);
}

#[test]
fn invocation_spanning_lines() {
    let got = token_texts("#define ADD(a,b) a+b\nint c = ADD(\n 1 , 2 );\n");
    assert_eq!(got, vec!["int", "c", "=", "1", "+", "2", ";"]);
}

#[test]
fn nested_invocations() {
    let src = "#define MAX(a,b) ((a)>(b)?(a):(b))\nMAX( MAX(10,12), 20 )\n";
    let got = token_texts(src).join("");
    assert_eq!(
        got,
        "((((10)>(12)?(10):(12)))>(20)?(((10)>(12)?(10):(12))):(20))"
    );
}

#[test]
fn self_referential_macro_expands_once() {
    let got = token_texts("#define F(x) F(x+1)\nF(0)\n");
    assert_eq!(got, vec!["F", "(", "0", "+", "1", ")"]);
}

#[test]
fn object_macro_mentioning_itself() {
    let got = token_texts("#define M x M y\nM\n");
    assert_eq!(got, vec!["x", "M", "y"]);
}

#[test]
fn function_like_name_without_parens() {
    let got = token_texts("#define F(x) x\nint F;\n");
    assert_eq!(got, vec!["int", "F", ";"]);
}

#[test]
fn stringification() {
    let got = token_stream("#define STR(x) #x\nSTR(a + b)\n");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].0, "STRING");
    assert_eq!(got[0].1, "\"a + b\"");
}

#[test]
fn token_pasting() {
    let got = token_texts("#define PASTE(a,b) a ## b\nint var123 = PASTE(var, 123);\n");
    assert_eq!(got, vec!["int", "var123", "=", "var123", ";"]);
}

#[test]
fn variadic_macro() {
    let got = token_texts("#define CALL(f, ...) f(__VA_ARGS__)\nCALL(g, 1, 2)\n");
    assert_eq!(got, vec!["g", "(", "1", ",", "2", ")"]);
}

#[test]
fn expansion_producing_invocation_pulls_next_line() {
    let src = "#define G(x) x\n#define E G\nE\n(7)\n";
    assert_eq!(token_texts(src), vec!["7"]);
}

#[test]
fn cmdline_define() {
    let got = token_stream_with_args(&["-D", "VAL=7", "-"], "VAL\n");
    assert_eq!(got, vec![("NUMBER".to_string(), "7".to_string())]);
}

#[test]
fn cmdline_define_default_value() {
    let got = token_stream_with_args(&["-D", "FLAG", "-"], "#if FLAG\nyes\n#endif\n");
    assert_eq!(got, vec![("IDENT".to_string(), "yes".to_string())]);
}

#[test]
fn cmdline_undefine() {
    let got = token_stream_with_args(
        &["-D", "FLAG", "-U", "FLAG", "-"],
        "#ifdef FLAG\nyes\n#else\nno\n#endif\n",
    );
    assert_eq!(got, vec![("IDENT".to_string(), "no".to_string())]);
}

#[test]
fn line_macro_tracks_lines() {
    let got = token_texts("__LINE__\n__LINE__\n");
    assert_eq!(got, vec!["1", "2"]);
}

#[test]
fn file_macro() {
    let got = token_texts("__FILE__\n");
    assert_eq!(got, vec!["\"<stdin>\""]);
}
