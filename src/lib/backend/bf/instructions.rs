use itertools::Itertools;
use std::fmt;

/// The eight primitives of the tape machine. A compiled program is an
/// ordered sequence of these; `LoopStart`/`LoopEnd` always form a
/// well-nested bracket structure in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BfIns {
    MoveRight,
    MoveLeft,
    Inc,
    Dec,
    Output,
    Input,
    LoopStart,
    LoopEnd,
}

impl BfIns {
    pub fn symbol(&self) -> char {
        match self {
            BfIns::MoveRight => '>',
            BfIns::MoveLeft => '<',
            BfIns::Inc => '+',
            BfIns::Dec => '-',
            BfIns::Output => '.',
            BfIns::Input => ',',
            BfIns::LoopStart => '[',
            BfIns::LoopEnd => ']',
        }
    }

    pub fn from_char(c: char) -> Option<BfIns> {
        match c {
            '>' => Some(BfIns::MoveRight),
            '<' => Some(BfIns::MoveLeft),
            '+' => Some(BfIns::Inc),
            '-' => Some(BfIns::Dec),
            '.' => Some(BfIns::Output),
            ',' => Some(BfIns::Input),
            '[' => Some(BfIns::LoopStart),
            ']' => Some(BfIns::LoopEnd),
            _ => None,
        }
    }
}

impl fmt::Display for BfIns {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.symbol().to_string().as_str())
    }
}

/// Scans program text into instructions, keeping each instruction's
/// character index in the original text for diagnostics. Every
/// character outside the eight-symbol alphabet is a comment and is
/// skipped.
pub fn scan_program(text: &str) -> (Vec<BfIns>, Vec<usize>) {
    let mut instructions = vec![];
    let mut positions = vec![];
    for (idx, c) in text.char_indices() {
        if let Some(ins) = BfIns::from_char(c) {
            instructions.push(ins);
            positions.push(idx);
        }
    }
    (instructions, positions)
}

/// Renders an instruction sequence as program text, wrapped to
/// `width` symbols per line so long literal runs stay reviewable.
pub fn render_program(instructions: &[BfIns], width: usize) -> String {
    let width = if width == 0 { usize::max_value() } else { width };
    let mut rendered = instructions
        .chunks(width)
        .map(|chunk| chunk.iter().map(BfIns::symbol).collect::<String>())
        .join("\n");
    if !rendered.is_empty() {
        rendered.push('\n');
    }
    rendered
}

#[test]
fn symbol_round_trip_test() {
    let all = [
        BfIns::MoveRight,
        BfIns::MoveLeft,
        BfIns::Inc,
        BfIns::Dec,
        BfIns::Output,
        BfIns::Input,
        BfIns::LoopStart,
        BfIns::LoopEnd,
    ];
    for ins in &all {
        assert_eq!(BfIns::from_char(ins.symbol()), Some(*ins));
    }
}

#[test]
fn scan_skips_comment_characters_test() {
    let (instructions, positions) = scan_program("add two cells: +>+ done");
    assert_eq!(
        instructions,
        vec![BfIns::Inc, BfIns::MoveRight, BfIns::Inc]
    );
    assert_eq!(positions, vec![15, 16, 17]);
}

#[test]
fn render_wraps_test() {
    let instructions = vec![BfIns::Inc; 5];
    assert_eq!(render_program(&instructions, 2), "++\n++\n+\n");
}
