pub mod bf;

use getopts::{Matches, Options};

use errors::CompileError;
use parser;

pub trait Backend {
    fn compile_ast(
        &self,
        path: &str,
        ast: &[parser::Stmt],
        do_verbose: bool,
        output_path: String,
    ) -> Result<(), CompileError>;
}

pub fn register_cli_options(options: &mut Options) {
    options.optopt(
        "",
        "backend",
        "specifies the compiler backend to use (default: bf)",
        "bf",
    );

    bf::register_cli_options(options);
}

pub fn init_from_cli_options(matches: &Matches) -> Result<Box<dyn Backend>, String> {
    match matches.opt_str("backend") {
        None => bf::init_from_cli_options(&matches),
        Some(ref choice) if &choice[..] == "bf" => bf::init_from_cli_options(&matches),
        Some(choice) => Err(format!("Unrecognized choice of backend: {}", choice)),
    }
}
