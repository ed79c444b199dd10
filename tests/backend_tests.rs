extern crate bfscriptlib;
/// Integration tests for backend selection and CLI registration.
extern crate getopts;

use getopts::Options;

use bfscriptlib::backend;

#[test]
fn test() {
    let mut opts = Options::new();
    backend::register_cli_options(&mut opts);
    assert!(opts.usage("").len() > 0);
}
