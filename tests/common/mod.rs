use std::fs;

use bfscriptlib;
use bfscriptlib::backend::bf::BfBackend;
use bfscriptlib::errors::{CompileError, RuntimeError};
use bfscriptlib::interpreter::{MachineOptions, TapeMachine};
use tempfile::NamedTempFile;

/// Compiles a program from bfs_programs/ and returns the compiled tape
/// program text.
pub fn compile_to_text(test_file: &str) -> Result<String, CompileError> {
    let compile_to_path = String::from(
        NamedTempFile::new()
            .unwrap()
            .path()
            .to_str()
            .expect("valid tempfile path"),
    );
    bfscriptlib::compile(
        &format!("bfs_programs/{}", test_file)[..],
        Box::new(BfBackend::default()),
        false,
        Some(compile_to_path.clone()),
    )?;
    Ok(fs::read_to_string(&compile_to_path).expect("compiled program is readable"))
}

/// Compiles a program and executes it with the given machine options,
/// returning the machine for output/state assertions.
pub fn compile_and_run_with(
    test_file: &str,
    options: &MachineOptions,
) -> Result<TapeMachine, RuntimeError> {
    let text = compile_to_text(test_file).expect("compilation succeeds");
    let mut machine = TapeMachine::new(&text[..], options)?;
    machine.run().map(|_| machine)
}

/// Compiles and executes with default options plus the given input,
/// returning the output bytes.
pub fn compile_and_run(test_file: &str, input: &str) -> Vec<u8> {
    let options = MachineOptions {
        input: input.to_string(),
        ..MachineOptions::default()
    };
    let machine = compile_and_run_with(test_file, &options).expect("execution succeeds");
    machine.output().to_vec()
}
