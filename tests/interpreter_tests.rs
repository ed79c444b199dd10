/// Integration tests for just the tape machine.

extern crate bfscriptlib;
#[macro_use]
extern crate matches;
#[macro_use]
extern crate quickcheck;

use bfscriptlib::errors::RuntimeError;
use bfscriptlib::interpreter::{MachineOptions, TapeMachine};

fn run(program: &str, options: &MachineOptions) -> TapeMachine {
    let mut machine = TapeMachine::new(program, options).expect("program loads");
    machine.run().expect("program runs");
    machine
}

fn options_with_bits(cell_bits: u32) -> MachineOptions {
    MachineOptions {
        cell_bits,
        ..MachineOptions::default()
    }
}

#[test]
fn mtest_dec_wraps_to_width_maximum() {
    for &(bits, expected) in &[
        (8, 0xFFu64),
        (16, 0xFFFF),
        (32, 0xFFFF_FFFF),
        (64, u64::max_value()),
    ] {
        let machine = run("-", &options_with_bits(bits));
        assert_eq!(machine.cell(0), Some(expected), "width {}", bits);
    }
}

#[test]
fn mtest_inc_wraps_back_to_zero() {
    for &bits in &[8u32, 16, 32, 64] {
        let machine = run("-+", &options_with_bits(bits));
        assert_eq!(machine.cell(0), Some(0), "width {}", bits);
    }
}

#[test]
fn mtest_output_takes_low_byte() {
    // 16-bit cell holds 256 + 65; the written byte is 'A'.
    let mut program = String::from("-");
    program.push_str(&"+".repeat(322));
    program.push('.');
    let machine = run(&program, &options_with_bits(16));
    // 0xFFFF + 322 wraps to 321 = 0x0141; low byte 0x41.
    assert_eq!(machine.output(), b"A");
}

#[test]
fn mtest_input_exhaustion_stores_zero() {
    let options = MachineOptions {
        input: "A".to_string(),
        ..MachineOptions::default()
    };
    let machine = run(",.,.", &options);
    assert_eq!(machine.output(), &[65, 0]);
}

#[test]
fn mtest_comment_characters_are_ignored() {
    let machine = run("three plus! +++ then emit?\n.", &MachineOptions::default());
    assert_eq!(machine.output(), &[3]);
}

#[test]
fn mtest_move_left_out_of_bounds() {
    let mut machine = TapeMachine::new("<", &MachineOptions::default()).unwrap();
    let err = machine.run().unwrap_err();
    assert_eq!(
        err,
        RuntimeError::OutOfBoundsAccess {
            pointer: 0,
            position: 0
        }
    );
}

#[test]
fn mtest_move_right_out_of_bounds() {
    let options = MachineOptions {
        memory_size: 4,
        ..MachineOptions::default()
    };
    let mut machine = TapeMachine::new(">>>>", &options).unwrap();
    let err = machine.run().unwrap_err();
    assert_matches!(err, RuntimeError::OutOfBoundsAccess { pointer: 3, .. });
}

#[test]
fn mtest_timeout_preserves_output() {
    let options = MachineOptions {
        max_time: Some(0.2),
        ..MachineOptions::default()
    };
    let mut machine = TapeMachine::new(".+[]", &options).unwrap();
    let err = machine.run().unwrap_err();
    assert_matches!(err, RuntimeError::ExecutionTimeout { .. });
    assert_eq!(machine.output(), &[0]);
}

#[test]
fn mtest_unbalanced_brackets_reported_at_load() {
    let err = TapeMachine::new("+[+", &MachineOptions::default()).unwrap_err();
    assert_eq!(err, RuntimeError::UnbalancedBrackets { position: 1 });
}

#[test]
fn mtest_invalid_cell_width() {
    let options = MachineOptions {
        cell_bits: 12,
        ..MachineOptions::default()
    };
    let err = TapeMachine::new("+", &options).unwrap_err();
    assert_eq!(err, RuntimeError::UnsupportedCellWidth(12));
}

#[test]
fn mtest_invalid_memory_size() {
    let options = MachineOptions {
        memory_size: 0,
        ..MachineOptions::default()
    };
    let err = TapeMachine::new("+", &options).unwrap_err();
    assert_eq!(err, RuntimeError::InvalidMemorySize(0));
}

#[test]
fn mtest_reset_restores_pristine_state() {
    let options = MachineOptions {
        input: "AB".to_string(),
        ..MachineOptions::default()
    };
    let mut machine = TapeMachine::new(",.", &options).unwrap();
    machine.run().unwrap();
    assert_eq!(machine.output(), b"A");
    machine.reset();
    assert_eq!(machine.output(), b"");
    assert_eq!(machine.cell(0), Some(0));
    machine.run().unwrap();
    // Input restarts from the beginning as well.
    assert_eq!(machine.output(), b"A");
}

#[test]
fn mtest_memory_view_marks_pointer() {
    let machine = run("+>++", &MachineOptions::default());
    let view = machine.memory_view(0, 2);
    assert!(view.contains("[0]: 1"));
    assert!(view.contains("[1]: 2  (pointer)"));
}

quickcheck! {
    fn prop_literal_run_outputs_value(n: u8) -> bool {
        let mut program = "+".repeat(n as usize);
        program.push('.');
        let machine = run(&program, &options_with_bits(8));
        machine.output() == &[n][..]
    }

    fn prop_inc_then_dec_is_identity(n: u8) -> bool {
        let mut program = "+".repeat(n as usize);
        program.push_str(&"-".repeat(n as usize));
        let machine = run(&program, &options_with_bits(8));
        machine.cell(0) == Some(0)
    }

    fn prop_loading_arbitrary_text_never_panics(text: String) -> bool {
        // Loading either succeeds or reports unbalanced brackets; any
        // other character is comment noise.
        match TapeMachine::new(&text, &MachineOptions::default()) {
            Ok(_) => true,
            Err(RuntimeError::UnbalancedBrackets { .. }) => true,
            Err(_) => false,
        }
    }
}
