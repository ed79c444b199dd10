/// Integration tests for the entire compiler: each test lowers a
/// program from bfs_programs/ and executes it on the tape machine.

extern crate bfscriptlib;
#[macro_use]
extern crate matches;
extern crate tempfile;

mod common;

use std::path::Path;

use bfscriptlib::backend::bf::BfBackend;
use bfscriptlib::errors::{CompileError, RuntimeError};
use bfscriptlib::interpreter::MachineOptions;
use common::{compile_and_run, compile_and_run_with, compile_to_text};
use tempfile::NamedTempFile;

fn compile_error(test_file: &str) -> CompileError {
    let compile_to_path = String::from(
        NamedTempFile::new()
            .unwrap()
            .path()
            .to_str()
            .expect("valid tempfile path"),
    );
    let err = bfscriptlib::compile(
        &format!("bfs_programs/{}", test_file)[..],
        Box::new(BfBackend::default()),
        false,
        Some(compile_to_path.clone()),
    )
    .expect_err("compilation must fail");
    // A rejected program must leave no artifact behind.
    assert!(
        !Path::new(&compile_to_path).exists(),
        "rejected compilation wrote an output file"
    );
    err
}

#[test]
fn ctest_hello() {
    assert_eq!(compile_and_run("ctest_hello.bfs", ""), b"Hi\n");
}

#[test]
fn ctest_literal_arithmetic() {
    assert_eq!(compile_and_run("ctest_literal_arithmetic.bfs", ""), b"*0");
}

#[test]
fn ctest_add_vars() {
    assert_eq!(compile_and_run("ctest_add_vars.bfs", ""), b"*0");
}

#[test]
fn ctest_sub_vars() {
    assert_eq!(compile_and_run("ctest_sub_vars.bfs", ""), b"*2");
}

#[test]
fn ctest_comparisons() {
    assert_eq!(compile_and_run("ctest_comparisons.bfs", ""), b"10100111");
}

#[test]
fn ctest_if_else() {
    assert_eq!(compile_and_run("ctest_if_else.bfs", ""), b"ynt\n");
}

#[test]
fn ctest_while() {
    assert_eq!(compile_and_run("ctest_while.bfs", ""), b"54321\n");
}

#[test]
fn ctest_scopes() {
    assert_eq!(compile_and_run("ctest_scopes.bfs", ""), b"217\n");
}

#[test]
fn ctest_assign_self() {
    assert_eq!(compile_and_run("ctest_assign_self.bfs", ""), b"* \n");
}

#[test]
fn ctest_unary() {
    assert_eq!(compile_and_run("ctest_unary.bfs", ""), b"01\n");
}

#[test]
fn ctest_return_is_inert() {
    assert_eq!(compile_and_run("ctest_return.bfs", ""), b"d");
}

#[test]
fn ctest_pyramid() {
    // Pins if/while lowering and arithmetic lowering at once.
    assert_eq!(compile_and_run("ctest_pyramid.bfs", ""), b"  *\n **\n***\n");
}

#[test]
fn ctest_pyramid_at_eight_bits() {
    let options = MachineOptions {
        cell_bits: 8,
        ..MachineOptions::default()
    };
    let machine = compile_and_run_with("ctest_pyramid.bfs", &options).unwrap();
    assert_eq!(machine.output(), b"  *\n **\n***\n");
}

#[test]
fn ctest_input_echo() {
    assert_eq!(compile_and_run("ctest_input_echo.bfs", "Hi"), b"Hi");
}

#[test]
fn ctest_input_exhausted_reads_zero() {
    assert_eq!(compile_and_run("ctest_input_exhausted.bfs", "A"), &[65, 0]);
}

#[test]
fn ctest_define() {
    assert_eq!(compile_and_run("ctest_define.bfs", ""), b"*\n");
}

#[test]
fn ctest_include() {
    assert_eq!(compile_and_run("ctest_include.bfs", ""), b"Hi\n");
}

#[test]
fn ctest_compilation_is_deterministic() {
    let first = compile_to_text("ctest_pyramid.bfs").unwrap();
    let second = compile_to_text("ctest_pyramid.bfs").unwrap();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn ctest_generated_brackets_balance() {
    let text = compile_to_text("ctest_pyramid.bfs").unwrap();
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                assert!(depth >= 0);
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0);
}

#[test]
fn ctest_timeout_fires() {
    let options = MachineOptions {
        max_time: Some(1.0),
        ..MachineOptions::default()
    };
    let started = std::time::Instant::now();
    let err = compile_and_run_with("ctest_loop_forever.bfs", &options).err().unwrap();
    assert_matches!(err, RuntimeError::ExecutionTimeout { .. });
    // Fires within a bounded margin past the one-second limit.
    assert!(started.elapsed().as_secs_f64() < 5.0);
}

#[test]
fn ctest_reject_push() {
    let err = compile_error("ctest_reject_push.bfs");
    assert_matches!(err, CompileError::UnsupportedFeature(_));
}

#[test]
fn ctest_reject_stack_decl() {
    let err = compile_error("ctest_reject_stack_decl.bfs");
    assert_matches!(err, CompileError::UnsupportedFeature(_));
}

#[test]
fn ctest_reject_pop() {
    let err = compile_error("ctest_reject_pop.bfs");
    assert_matches!(err, CompileError::UnsupportedFeature(_));
}

#[test]
fn ctest_reject_call() {
    let err = compile_error("ctest_reject_call.bfs");
    assert_matches!(err, CompileError::UnsupportedFeature(_));
}

#[test]
fn ctest_reject_runtime_mul() {
    let err = compile_error("ctest_reject_mul.bfs");
    assert_matches!(err, CompileError::UnsupportedOperation(_));
}

#[test]
fn ctest_reject_undeclared() {
    let err = compile_error("ctest_reject_undeclared.bfs");
    assert_matches!(err, CompileError::UndeclaredVariable(_));
}

#[test]
fn ctest_reject_duplicate() {
    let err = compile_error("ctest_reject_duplicate.bfs");
    assert_matches!(err, CompileError::DuplicateDeclaration(_));
}

#[test]
fn ctest_reject_void_declaration() {
    let err = compile_error("ctest_reject_void.bfs");
    assert_matches!(err, CompileError::TypeMismatch(_));
}
