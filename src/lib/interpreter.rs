//! The tape machine: executes a compiled primitive stream against a
//! fixed-size tape of unsigned cells.
//!
//! Semantics pinned here rather than left to chance:
//! - cell increment/decrement wraps modulo `2^bits` and is never an
//!   error;
//! - `Input` past the end of the provided input stores 0 — deliberately
//!   defined behavior, not an `InputExhausted` error, so runs are
//!   deterministic for any input length;
//! - moving the pointer outside `[0, memory_size)` is fatal;
//! - output produced before a failure is preserved and retrievable.

use std::fmt;
use std::time::{Duration, Instant};

use backend::bf::instructions::{scan_program, BfIns};
use errors::RuntimeError;

/// How many steps run between wall-clock checks. The watchdog is polled
/// inline, so the margin past the configured limit is bounded by the
/// time these steps take.
const TIMEOUT_CHECK_INTERVAL: u64 = 4096;

/// Execution parameters, mirroring the CLI surface.
#[derive(Debug, Clone)]
pub struct MachineOptions {
    /// Number of cells on the tape.
    pub memory_size: usize,
    /// Cell width in bits: 8, 16, 32 or 64.
    pub cell_bits: u32,
    /// Bytes consumed by the input primitive.
    pub input: String,
    /// Wall-clock limit in seconds; `None` runs unbounded.
    pub max_time: Option<f64>,
}

impl Default for MachineOptions {
    fn default() -> MachineOptions {
        MachineOptions {
            memory_size: 30000,
            cell_bits: 32,
            input: String::new(),
            max_time: Some(5.0),
        }
    }
}

#[derive(Debug)]
pub struct TapeMachine {
    code: Vec<BfIns>,
    /// Each instruction's character index in the original program text,
    /// for diagnostics.
    positions: Vec<usize>,
    /// Partner index for each bracket; untouched for other instructions.
    jumps: Vec<usize>,
    memory: Vec<u64>,
    cell_mask: u64,
    cell_bits: u32,
    pointer: usize,
    ip: usize,
    input: Vec<u8>,
    input_cursor: usize,
    output: Vec<u8>,
    max_time: Option<Duration>,
    max_time_secs: f64,
    elapsed: Duration,
    finished: bool,
}

impl TapeMachine {
    /// Scans `program` (non-command characters are comments), validates
    /// the configuration, and precomputes the bracket jump table.
    pub fn new(program: &str, options: &MachineOptions) -> Result<TapeMachine, RuntimeError> {
        if options.memory_size == 0 {
            return Err(RuntimeError::InvalidMemorySize(options.memory_size));
        }
        let cell_mask = match options.cell_bits {
            8 => 0xFF,
            16 => 0xFFFF,
            32 => 0xFFFF_FFFF,
            64 => u64::max_value(),
            other => return Err(RuntimeError::UnsupportedCellWidth(other)),
        };

        let (code, positions) = scan_program(program);
        let jumps = build_jump_table(&code, &positions)?;

        Ok(TapeMachine {
            code,
            positions,
            jumps,
            memory: vec![0; options.memory_size],
            cell_mask,
            cell_bits: options.cell_bits,
            pointer: 0,
            ip: 0,
            input: options.input.clone().into_bytes(),
            input_cursor: 0,
            output: vec![],
            max_time: options.max_time.map(Duration::from_secs_f64),
            max_time_secs: options.max_time.unwrap_or(0.0),
            elapsed: Duration::from_secs(0),
            finished: false,
        })
    }

    /// Steps until the instruction pointer passes the end of the
    /// stream, a fatal error occurs, or the watchdog fires. Running a
    /// finished machine is a no-op; use [`TapeMachine::reset`] first to
    /// run again.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        if self.finished {
            return Ok(());
        }

        let start = Instant::now();
        let mut steps: u64 = 0;

        while self.ip < self.code.len() {
            steps += 1;
            if steps % TIMEOUT_CHECK_INTERVAL == 0 {
                if let Some(limit) = self.max_time {
                    let elapsed = start.elapsed();
                    if elapsed > limit {
                        self.elapsed = elapsed;
                        self.finished = true;
                        return Err(RuntimeError::ExecutionTimeout {
                            limit_secs: self.max_time_secs,
                        });
                    }
                }
            }

            match self.code[self.ip] {
                BfIns::MoveRight => {
                    if self.pointer + 1 >= self.memory.len() {
                        self.finished = true;
                        return Err(self.out_of_bounds());
                    }
                    self.pointer += 1;
                }
                BfIns::MoveLeft => {
                    if self.pointer == 0 {
                        self.finished = true;
                        return Err(self.out_of_bounds());
                    }
                    self.pointer -= 1;
                }
                BfIns::Inc => {
                    let value = self.memory[self.pointer];
                    self.memory[self.pointer] = value.wrapping_add(1) & self.cell_mask;
                }
                BfIns::Dec => {
                    let value = self.memory[self.pointer];
                    self.memory[self.pointer] = value.wrapping_sub(1) & self.cell_mask;
                }
                BfIns::Output => {
                    let value = self.memory[self.pointer];
                    self.output.push((value & 0xFF) as u8);
                }
                BfIns::Input => {
                    // Exhausted input reads as zero by definition.
                    let value = match self.input.get(self.input_cursor) {
                        Some(byte) => {
                            self.input_cursor += 1;
                            u64::from(*byte)
                        }
                        None => 0,
                    };
                    self.memory[self.pointer] = value & self.cell_mask;
                }
                BfIns::LoopStart => {
                    if self.memory[self.pointer] == 0 {
                        self.ip = self.jumps[self.ip];
                    }
                }
                BfIns::LoopEnd => {
                    if self.memory[self.pointer] != 0 {
                        self.ip = self.jumps[self.ip];
                    }
                }
            }
            self.ip += 1;
        }

        self.elapsed = start.elapsed();
        self.finished = true;
        Ok(())
    }

    fn out_of_bounds(&self) -> RuntimeError {
        RuntimeError::OutOfBoundsAccess {
            pointer: self.pointer,
            position: self.positions[self.ip],
        }
    }

    /// All output produced so far, including bytes written before a
    /// failure.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn execution_time(&self) -> Duration {
        self.elapsed
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cell(&self, index: usize) -> Option<u64> {
        self.memory.get(index).cloned()
    }

    /// Restores the pristine pre-run state: zeroed tape, pointers and
    /// cursors at the start, empty output.
    pub fn reset(&mut self) {
        for cell in &mut self.memory {
            *cell = 0;
        }
        self.pointer = 0;
        self.ip = 0;
        self.input_cursor = 0;
        self.output.clear();
        self.elapsed = Duration::from_secs(0);
        self.finished = false;
    }

    /// Renders the half-open cell range `[start, end)` with the final
    /// pointer marked, for post-run inspection.
    pub fn memory_view(&self, start: usize, end: usize) -> String {
        let end = end.min(self.memory.len());
        let mut lines = vec![];
        for index in start..end {
            let marker = if index == self.pointer {
                "  (pointer)"
            } else {
                ""
            };
            lines.push(format!("[{}]: {}{}", index, self.memory[index], marker));
        }
        lines.join("\n")
    }
}

impl fmt::Display for TapeMachine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "--- tape machine state ---")?;
        writeln!(
            f,
            " status    : {}",
            if self.finished { "finished" } else { "not run" }
        )?;
        writeln!(f, " code ptr  : {} / {}", self.ip, self.code.len())?;
        writeln!(f, " data ptr  : {}", self.pointer)?;
        writeln!(f, " cell bits : {}", self.cell_bits)?;
        writeln!(f, " input read: {} bytes", self.input_cursor)?;
        writeln!(f, " output    : {} bytes", self.output.len())?;
        write!(f, " exec time : {:?}", self.elapsed)
    }
}

/// Single scan pairing every bracket with its partner. A close without
/// an open, or an open left on the stack at the end, is an
/// `UnbalancedBrackets` error carrying the source position.
fn build_jump_table(code: &[BfIns], positions: &[usize]) -> Result<Vec<usize>, RuntimeError> {
    let mut jumps = vec![0; code.len()];
    let mut stack = vec![];
    for (index, ins) in code.iter().enumerate() {
        match ins {
            BfIns::LoopStart => stack.push(index),
            BfIns::LoopEnd => {
                let partner = stack.pop().ok_or(RuntimeError::UnbalancedBrackets {
                    position: positions[index],
                })?;
                jumps[index] = partner;
                jumps[partner] = index;
            }
            _ => {}
        }
    }
    if let Some(unmatched) = stack.pop() {
        return Err(RuntimeError::UnbalancedBrackets {
            position: positions[unmatched],
        });
    }
    Ok(jumps)
}

#[test]
fn hello_output_test() {
    let program = "++++++++[>++++++++<-]>+."; // 65 = 'A'
    let mut machine = TapeMachine::new(program, &MachineOptions::default()).unwrap();
    machine.run().unwrap();
    assert_eq!(machine.output(), b"A");
}

#[test]
fn jump_table_pairs_test() {
    let (code, positions) = scan_program("[[]]");
    let jumps = build_jump_table(&code, &positions).unwrap();
    assert_eq!(jumps, vec![3, 2, 1, 0]);
}

#[test]
fn unbalanced_open_test() {
    let err = TapeMachine::new("+[", &MachineOptions::default()).unwrap_err();
    assert_eq!(err, RuntimeError::UnbalancedBrackets { position: 1 });
}

#[test]
fn unbalanced_close_test() {
    let err = TapeMachine::new("+]", &MachineOptions::default()).unwrap_err();
    assert_eq!(err, RuntimeError::UnbalancedBrackets { position: 1 });
}
