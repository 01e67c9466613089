//
// Copyright (c) 2025-2026 Jeff Garzik
//
// This file is part of the posixutils-cpp project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//
// pcpp - C preprocessor
//

use clap::Parser;
use gettextrs::{bind_textdomain_codeset, gettext, setlocale, textdomain, LocaleCategory};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use posixutils_cpp::diag::{self, Position, PpError, PpErrorKind, PpResult};
use posixutils_cpp::token::{show_token, token_type_name, Preprocessor, TokenType};

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser)]
#[command(version, about = gettext("pcpp - preprocess standard C programs"))]
struct Args {
    /// Input files
    #[arg(required = true)]
    files: Vec<String>,

    /// Emit preprocessed source text
    #[arg(short = 'E', help = gettext("Preprocess only, output text to stdout"))]
    preprocess_only: bool,

    /// Define a macro (-D name or -D name=value)
    #[arg(short = 'D', action = clap::ArgAction::Append, value_name = "macro")]
    defines: Vec<String>,

    /// Undefine a macro
    #[arg(short = 'U', action = clap::ArgAction::Append, value_name = "macro")]
    undefines: Vec<String>,

    /// Add include path
    #[arg(short = 'I', action = clap::ArgAction::Append, value_name = "dir")]
    include_paths: Vec<String>,

    /// Place output in file
    #[arg(short = 'o', value_name = "file", help = gettext("Place output in file"))]
    output: Option<String>,

    /// Verbose output (trace tokens, include positions)
    #[arg(
        short = 'v',
        long = "verbose",
        help = gettext("Verbose output with position info")
    )]
    verbose: bool,
}

fn process_file(path: &str, args: &Args, output: &mut impl Write) -> PpResult<()> {
    let mut pp = Preprocessor::new();
    pp.set_verbose(args.verbose);
    for dir in &args.include_paths {
        pp.add_include_dir(dir);
    }

    // Read file (or stdin if path is "-")
    if path == "-" {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        pp.push_buffer("<stdin>", buffer);
    } else {
        pp.push_file(Path::new(path)).map_err(|e| {
            PpError::raise(
                PpErrorKind::Io,
                format!("{}: {}", path, e),
                Position::none(),
            )
        })?;
    }

    // Command-line definitions run through the normal pipeline
    for def in &args.defines {
        let (name, value) = match def.split_once('=') {
            Some((n, v)) => (n, v),
            None => (def.as_str(), "1"),
        };
        pp.inject_line(&format!("#define {} {}", name, value))?;
    }
    for name in &args.undefines {
        pp.undefine(name);
    }

    if args.preprocess_only {
        pp.preprocess(output)?;
        return Ok(());
    }

    // Default mode: dump the post-processed token stream
    loop {
        let t = pp.next()?;
        if t.typ == TokenType::End {
            break;
        }
        if args.verbose {
            writeln!(
                output,
                "{:>4} {:12} {}",
                t.pos.line,
                token_type_name(t.typ),
                show_token(&t, pp.strings())
            )?;
        } else {
            writeln!(
                output,
                "{:12} {}",
                token_type_name(t.typ),
                show_token(&t, pp.strings())
            )?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setlocale(LocaleCategory::LcAll, "");
    textdomain("posixutils-cpp")?;
    bind_textdomain_codeset("posixutils-cpp", "UTF-8")?;

    let args = Args::parse();

    let mut output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut exit_code = 0;
    for path in &args.files {
        diag::clear_streams();
        diag::reset_counts();
        if let Err(e) = process_file(path, &args, &mut output) {
            // fatal errors are already reported through the diagnostic
            // sink, except I/O faults raised without a position
            if e.kind == PpErrorKind::Io && e.pos.is_none() && diag::error_count() == 0 {
                eprintln!("pcpp: {}", e.message);
            }
            exit_code = 1;
            break;
        }
        if diag::error_count() > 0 {
            exit_code = 1;
        }
    }
    output.flush()?;

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
