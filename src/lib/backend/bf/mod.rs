use getopts::{Matches, Options};
use std::fs::File;
use std::io::Write;

use errors::CompileError;
use parser;

pub mod compiler;
pub mod instructions;
pub mod ir;
pub mod memory;

use self::compiler::compile_program;
use self::instructions::render_program;

const DEFAULT_WRAP_WIDTH: usize = 72;

/// The tape backend: lowers the AST to the eight-symbol alphabet and
/// writes the program text.
pub struct BfBackend {
    /// Symbols per output line; 0 writes a single unwrapped line.
    pub wrap_width: usize,
}

impl Default for BfBackend {
    fn default() -> BfBackend {
        BfBackend {
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }
}

impl ::Backend for BfBackend {
    fn compile_ast(
        &self,
        _path: &str,
        ast: &[parser::Stmt],
        do_verbose: bool,
        output_path: String,
    ) -> Result<(), CompileError> {
        // Generate fully before touching the file system, so a rejected
        // program leaves no partial artifact behind.
        let instructions = compile_program(ast)?;

        if do_verbose {
            println!(
                "Lowered {} statements to {} primitives.",
                ast.len(),
                instructions.len()
            );
        }

        let rendered = render_program(&instructions, self.wrap_width);
        let mut file = File::create(&output_path)
            .map_err(|e| CompileError::Io(format!("cannot create {}: {}", output_path, e)))?;
        file.write_all(rendered.as_bytes())
            .map_err(|e| CompileError::Io(format!("cannot write {}: {}", output_path, e)))?;

        if do_verbose {
            println!("Wrote tape program to {}", output_path);
        }

        Ok(())
    }
}

pub fn register_cli_options(options: &mut Options) {
    options.optopt(
        "",
        "bf-wrap",
        &format!(
            "symbols per line in the compiled output, 0 for one line (default: {})",
            DEFAULT_WRAP_WIDTH
        ),
        "COLS",
    );
}

pub fn init_from_cli_options(matches: &Matches) -> Result<Box<dyn (::Backend)>, String> {
    let wrap_width = match matches.opt_str("bf-wrap") {
        Some(colstr) => match colstr.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return Err(format!(
                    "Unrecognized value \"{}\" for --bf-wrap; need a non-negative integer.",
                    colstr
                ));
            }
        },
        None => DEFAULT_WRAP_WIDTH,
    };
    Ok(Box::new(BfBackend { wrap_width }))
}
