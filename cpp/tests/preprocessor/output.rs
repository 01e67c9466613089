//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Output tests: -E text emission, string-literal merging and stream
// fidelity between the two modes.
//

use crate::common::{preprocess_text, run_pcpp, token_stream};

#[test]
fn preprocessed_text_basic() {
    assert_eq!(
        preprocess_text("#define X 42\nint a = X;\n"),
        "int a = 42;\n"
    );
}

#[test]
fn preprocessed_text_keeps_blank_lines() {
    assert_eq!(preprocess_text("a\n\nb\n"), "a\n\nb\n");
}

#[test]
fn preprocessed_text_keeps_indentation() {
    assert_eq!(preprocess_text("  a\n"), "  a\n");
}

#[test]
fn preprocessed_text_does_not_merge_strings() {
    assert_eq!(preprocess_text("\"foo\" \"bar\"\n"), "\"foo\" \"bar\"\n");
}

#[test]
fn string_literals_merge_in_token_stream() {
    let got = token_stream("\"foo\" \"bar\"\n");
    assert_eq!(got, vec![("STRING".to_string(), "\"foobar\"".to_string())]);
}

#[test]
fn string_merge_spans_lines() {
    let got = token_stream("\"a\"\n\"b\"\n\"c\"\n");
    assert_eq!(got, vec![("STRING".to_string(), "\"abc\"".to_string())]);
}

#[test]
fn char_constants_become_numbers() {
    let got = token_stream("'A' '\\n'\n");
    assert_eq!(
        got,
        vec![
            ("NUMBER".to_string(), "65".to_string()),
            ("NUMBER".to_string(), "10".to_string()),
        ]
    );
}

#[test]
fn numeric_conversion() {
    let got = token_stream("0x10 017 1e1\n");
    assert_eq!(
        got,
        vec![
            ("NUMBER".to_string(), "16".to_string()),
            ("NUMBER".to_string(), "15".to_string()),
            ("NUMBER".to_string(), "10".to_string()),
        ]
    );
}

#[test]
fn preprocess_output_round_trips() {
    let src = "#define ADD(a,b) a+b\nint c = ADD(1, 2);\n\"x\" \"y\"\n";

    let once = preprocess_text(src);
    let twice = preprocess_text(&once);
    assert_eq!(once, twice);

    // the token stream of the -E output matches the direct stream
    assert_eq!(token_stream(src), token_stream(&once));
}

#[test]
fn output_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_path = dir.path().join("out.i");

    let out = run_pcpp(&["-E", "-o", out_path.to_str().unwrap(), "-"], "int x;\n");
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    let text = std::fs::read_to_string(&out_path).expect("read output file");
    assert_eq!(text, "int x;\n");
}

#[test]
fn comments_are_stripped() {
    assert_eq!(preprocess_text("a /* c */ b\n"), "a   b\n");
    assert_eq!(token_stream("a // rest\n").len(), 1);
}

#[test]
fn spliced_lines_join() {
    let got = token_stream("int a\\\nb;\n");
    assert_eq!(
        got,
        vec![
            ("KEYWORD".to_string(), "int".to_string()),
            ("IDENT".to_string(), "ab".to_string()),
            ("SPECIAL".to_string(), ";".to_string()),
        ]
    );
}
