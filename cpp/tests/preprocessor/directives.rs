//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// Directive tests: conditional compilation, defined(), includes,
// #error/#warning, #line.
//

use crate::common::{run_pcpp, token_stream_with_args, token_texts};
use std::fs;
use std::io::Write;

#[test]
fn if_defined() {
    let src = "#define Q\n#if defined(Q)\nA\n#else\nB\n#endif\n";
    assert_eq!(token_texts(src), vec!["A"]);

    let src = "#if defined(Q)\nA\n#else\nB\n#endif\n";
    assert_eq!(token_texts(src), vec!["B"]);
}

#[test]
fn defined_without_parens() {
    let src = "#define Q\n#if defined Q\nA\n#endif\n";
    assert_eq!(token_texts(src), vec!["A"]);
}

#[test]
fn ifdef_ifndef() {
    let src = "#define X 1\n#ifdef X\na\n#endif\n#ifndef X\nb\n#endif\n";
    assert_eq!(token_texts(src), vec!["a"]);
}

#[test]
fn elif_chain() {
    let src = "#define V 2\n#if V == 1\nA\n#elif V == 2\nB\n#elif V == 3\nC\n#else\nD\n#endif\n";
    assert_eq!(token_texts(src), vec!["B"]);
}

#[test]
fn nested_conditionals_in_skipped_block() {
    let src = "#if 0\n#if 1\nA\n#endif\n#else\nB\n#endif\n";
    assert_eq!(token_texts(src), vec!["B"]);
}

#[test]
fn skipped_block_directives_ignored() {
    // the #define inside the dead branch must not take effect
    let src = "#if 0\n#define X 1\n#endif\n#ifdef X\nyes\n#else\nno\n#endif\n";
    assert_eq!(token_texts(src), vec!["no"]);
}

#[test]
fn if_expression_operators() {
    let src = "#if (1 << 4) == 16 && 10 / 3 == 3 && 'A' == 65\nok\n#endif\n";
    assert_eq!(token_texts(src), vec!["ok"]);
}

#[test]
fn undefined_identifier_is_zero() {
    let src = "#if UNDEFINED_THING\nA\n#else\nB\n#endif\n";
    assert_eq!(token_texts(src), vec!["B"]);
}

#[test]
fn undef_removes_definition() {
    let src = "#define X 1\n#undef X\n#ifdef X\nA\n#else\nB\n#endif\n";
    assert_eq!(token_texts(src), vec!["B"]);
}

#[test]
fn error_directive_is_fatal() {
    let out = run_pcpp(&["-E", "-"], "#error something broke\nx\n");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("something broke"), "stderr: {}", stderr);
}

#[test]
fn warning_directive_is_not_fatal() {
    let out = run_pcpp(&["-E", "-"], "#warning heads up\nx\n");
    assert_eq!(out.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("heads up"), "stderr: {}", stderr);
    assert_eq!(String::from_utf8_lossy(&out.stdout), "x\n");
}

#[test]
fn unterminated_conditional_sets_exit_code() {
    let out = run_pcpp(&["-E", "-"], "#if 1\nx\n");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unterminated"), "stderr: {}", stderr);
}

#[test]
fn missing_include_is_fatal() {
    let out = run_pcpp(&["-E", "-"], "#include \"no_such_file_pcpp.h\"\n");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn include_via_search_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let header = dir.path().join("values.h");
    let mut f = fs::File::create(&header).expect("create header");
    writeln!(f, "#define FROM_HEADER 5").expect("write header");
    drop(f);

    let src = "#include <values.h>\nFROM_HEADER\n";
    let got = token_stream_with_args(&["-I", dir.path().to_str().unwrap(), "-"], src);
    assert_eq!(got, vec![("NUMBER".to_string(), "5".to_string())]);
}

#[test]
fn quote_include_relative_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let header = dir.path().join("inner.h");
    fs::write(&header, "#define INNER 9\n").expect("write header");
    let main = dir.path().join("main.c");
    fs::write(&main, "#include \"inner.h\"\nINNER\n").expect("write main");

    let out = run_pcpp(&[main.to_str().unwrap()], "");
    assert!(
        out.status.success(),
        "pcpp failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let dump = crate::common::parse_dump(&String::from_utf8_lossy(&out.stdout));
    assert_eq!(dump, vec![("NUMBER".to_string(), "9".to_string())]);
}

#[test]
fn line_directive_renumbers() {
    let src = "#line 100\n__LINE__\n";
    assert_eq!(token_texts(src), vec!["100"]);
}

#[test]
fn pragma_is_discarded() {
    assert_eq!(token_texts("#pragma pack(1)\nx\n"), vec!["x"]);
    assert_eq!(token_texts("_Pragma(\"pack(1)\")\nx\n"), vec!["x"]);
}

#[test]
fn null_directive() {
    assert_eq!(token_texts("#\nx\n"), vec!["x"]);
}
