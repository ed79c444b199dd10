//! bfscript compiles BrainfuckScript source to tape programs and can
//! execute compiled programs on the built-in tape machine.

extern crate ansi_term;
extern crate bfscriptlib;
extern crate getopts;

use ansi_term::Colour::Red;
use getopts::{Matches, Options};
use std::env;
use std::fs;
use std::io::{self, Write};

use bfscriptlib::interpreter::{MachineOptions, TapeMachine};
use bfscriptlib::{backend, compile};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage(bin_name: &str, opts: Options) {
    let brief = format!(
        "Usage: {} SOURCE_FILE OUTPUT_FILE [options]\n       {} -e PROGRAM_FILE [INPUT] [options]",
        bin_name, bin_name
    );
    print!("{}", opts.usage(&brief));
}

fn fail(message: String) -> ! {
    eprintln!("{} {}", Red.paint("error:"), message);
    std::process::exit(1);
}

fn compile_source_file(matches: &Matches) -> Result<(), String> {
    let source_path = &matches.free[0];
    let output_path = matches.free[1].clone();

    let backend = backend::init_from_cli_options(matches)?;

    compile(
        &source_path[..],
        backend,
        matches.opt_present("verbose"),
        Some(output_path),
    )
    .map_err(|e| format!("{}", e))
}

fn machine_options(matches: &Matches) -> Result<MachineOptions, String> {
    let mut options = MachineOptions::default();

    if let Some(text) = matches.opt_str("memory-size") {
        options.memory_size = text
            .parse::<usize>()
            .map_err(|_| format!("invalid memory size: {}", text))?;
    }
    if let Some(text) = matches.opt_str("cell-bits") {
        options.cell_bits = text
            .parse::<u32>()
            .map_err(|_| format!("invalid cell width: {}", text))?;
    }
    if let Some(text) = matches.opt_str("max-time") {
        let secs = text
            .parse::<f64>()
            .map_err(|_| format!("invalid time limit: {}", text))?;
        // Zero or negative disables the watchdog.
        options.max_time = if secs > 0.0 { Some(secs) } else { None };
    }
    if matches.free.len() > 1 {
        options.input = matches.free[1].clone();
    }

    Ok(options)
}

fn execute_program_file(matches: &Matches) -> Result<(), String> {
    let program_path = &matches.free[0];
    let program = fs::read_to_string(program_path)
        .map_err(|e| format!("cannot read program {}: {}", program_path, e))?;

    let options = machine_options(matches)?;
    let do_verbose = matches.opt_present("verbose");

    let mut machine =
        TapeMachine::new(&program[..], &options).map_err(|e| format!("{}", e))?;
    let result = machine.run();

    // Whatever the run produced is flushed even when it failed.
    io::stdout()
        .write_all(machine.output())
        .and_then(|_| io::stdout().flush())
        .map_err(|e| format!("cannot write output: {}", e))?;

    if do_verbose {
        eprintln!(
            "Execution finished in {:.4} seconds.",
            machine.execution_time().as_secs_f64()
        );
    }
    if matches.opt_present("dump-memory") {
        eprintln!("{}", machine.memory_view(0, 16));
    }

    result.map_err(|e| format!("{}", e))
}

fn main() {
    let args: Vec<_> = env::args().collect();

    let mut opts = Options::new();

    opts.optflag("e", "execute", "execute a compiled tape program");
    opts.optflag("h", "help", "print usage");
    opts.optflag("v", "version", "print bfscript version");
    opts.optflag("", "verbose", "print progress and timing details");
    opts.optflag("", "dump-memory", "print the first tape cells after execution");

    opts.optopt(
        "m",
        "memory-size",
        "number of tape cells (default: 30000)",
        "N",
    );
    opts.optopt(
        "b",
        "cell-bits",
        "cell width in bits: 8, 16, 32 or 64 (default: 32)",
        "BITS",
    );
    opts.optopt(
        "t",
        "max-time",
        "execution time limit in seconds, 0 for unlimited (default: 5.0)",
        "SECS",
    );

    backend::register_cli_options(&mut opts);

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(_) => {
            print_usage(&args[0], opts);
            std::process::exit(1);
        }
    };

    if matches.opt_present("h") {
        print_usage(&args[0], opts);
        return;
    }

    if matches.opt_present("v") {
        println!("bfscript {}", VERSION);
        return;
    }

    if matches.opt_present("e") {
        if matches.free.is_empty() || matches.free.len() > 2 {
            print_usage(&args[0], opts);
            std::process::exit(1);
        }
        if let Err(e) = execute_program_file(&matches) {
            fail(e);
        }
    } else {
        if matches.free.len() != 2 {
            print_usage(&args[0], opts);
            std::process::exit(1);
        }
        if let Err(e) = compile_source_file(&matches) {
            fail(e);
        }
    }
}
