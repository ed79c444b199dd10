#![warn(trivial_numeric_casts)]

extern crate ansi_term;
extern crate getopts;
extern crate itertools;
extern crate linked_hash_set;
extern crate matches;
extern crate pest;
extern crate quickcheck;
extern crate rand;
extern crate regex;
extern crate tempfile;

#[macro_use]
extern crate pest_derive;

pub mod backend;
pub mod errors;
pub mod interpreter;
pub mod parser;
pub mod preprocessor;

use backend::Backend;
use errors::CompileError;
use std::fs;
use std::path::Path;

/// Compiles the BrainfuckScript source at `path`: preprocess, parse,
/// then hand the AST to the backend, which writes the tape program to
/// `optional_output_path` (default: the source name with a `.bf`
/// extension). Any failure leaves no output artifact behind.
pub fn compile(
    path: &str,
    backend: Box<dyn Backend>,
    do_verbose: bool,
    optional_output_path: Option<String>,
) -> Result<(), CompileError> {
    let source = fs::read_to_string(path)
        .map_err(|e| CompileError::Io(format!("cannot read source {}: {}", path, e)))?;

    let base_dir = Path::new(path).parent().unwrap_or_else(|| Path::new("."));
    let expanded = preprocessor::preprocess(&source, base_dir)?;

    let ast = parser::parse(&expanded[..])?;

    if do_verbose {
        for astnode in &ast {
            println!("{:?}", astnode);
        }
    }

    let output_path = match optional_output_path {
        Some(p) => p,
        None => compiled_name(path),
    };

    backend.compile_ast(path, &ast, do_verbose, output_path)
}

/// Convert "foo.bfs" to "foo.bf".
fn compiled_name(bfs_path: &str) -> String {
    let file_name = Path::new(bfs_path).file_name().unwrap().to_str().unwrap();

    let mut name_parts: Vec<_> = file_name.split('.').collect();
    let parts_len = name_parts.len();
    if parts_len > 1 {
        name_parts.pop();
    }

    name_parts.push("bf");
    name_parts.join(".")
}

#[test]
fn compiled_name_test() {
    assert_eq!(compiled_name("test.bfs"), "test.bf");
}

#[test]
fn compiled_name_relative_path_test() {
    assert_eq!(compiled_name("dir/test.bfs"), "test.bf");
}
