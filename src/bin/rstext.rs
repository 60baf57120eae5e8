//! Inspection CLI.
//!
//! Parses a file and prints the token stream or the document tree, for
//! debugging the parser and for wiring it into other tooling.
//!
//! Usage:
//!   rstext <input-file> [options]
//!
//! Options:
//!   --format <format>    Output format: tree (default), json, tokens
//!   --smileys            Recognize smileys in inline context
//!   --markdown           Enable fenced ``` code blocks
//!   --raw-directive      Honor the raw directive (untrusted input: keep off)
//!   --skip-pounds        Strip up to two leading '#' per line

use std::fs;
use std::io::Write;
use std::process;

use clap::{Arg, ArgAction, Command};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use rstext::messages::{ParseError, Severity};
use rstext::{parse, tokenize, Options, Token};

fn print_diagnostic(diag: &rstext::Diagnostic) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let color = match diag.severity() {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Hint => Color::Cyan,
    };
    let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(stderr, "{}", diag.severity());
    let _ = stderr.reset();
    let _ = writeln!(
        stderr,
        ": {}({}, {}) {}",
        diag.filename,
        diag.line,
        diag.col,
        diag.message()
    );
}

fn main() {
    let matches = Command::new("rstext")
        .version(env!("CARGO_PKG_VERSION"))
        .about("reStructuredText parser and AST inspection tool")
        .arg(Arg::new("input").help("Input file").required(true).index(1))
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Output format: tree, json, tokens")
                .default_value("tree"),
        )
        .arg(
            Arg::new("smileys")
                .long("smileys")
                .help("Recognize smileys in inline context")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("markdown")
                .long("markdown")
                .help("Enable fenced ``` code blocks")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("raw-directive")
                .long("raw-directive")
                .help("Honor the raw directive")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("skip-pounds")
                .long("skip-pounds")
                .help("Strip up to two leading '#' per line")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let input = match matches.get_one::<String>("input") {
        Some(input) => input.clone(),
        None => {
            eprintln!("Error: input file required");
            process::exit(2);
        }
    };
    let content = match fs::read_to_string(&input) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error: cannot read '{}': {}", input, err);
            process::exit(2);
        }
    };

    let options = Options {
        skip_pounds: matches.get_flag("skip-pounds"),
        support_smileys: matches.get_flag("smileys"),
        support_raw_directive: matches.get_flag("raw-directive"),
        support_markdown: matches.get_flag("markdown"),
    };

    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("tree");

    if format == "tokens" {
        let mut tokens: Vec<Token> = Vec::new();
        tokenize(&content, options.skip_pounds, &mut tokens);
        match serde_json::to_string_pretty(&tokens) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("Error: {}", err);
                process::exit(2);
            }
        }
        return;
    }

    let handler = Box::new(|diag: &rstext::Diagnostic| {
        print_diagnostic(diag);
        match diag.severity() {
            Severity::Error => Err(ParseError {
                diagnostic: diag.clone(),
            }),
            _ => Ok(()),
        }
    });

    match parse(&content, &input, 0, 0, options, None, Some(handler)) {
        Ok(out) => match format {
            "json" => match serde_json::to_string_pretty(&out.doc) {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    eprintln!("Error: {}", err);
                    process::exit(2);
                }
            },
            "tree" => print!("{}", out.doc.tree_string()),
            other => {
                eprintln!("Error: unknown format '{}'", other);
                process::exit(2);
            }
        },
        Err(_) => process::exit(1),
    }
}
