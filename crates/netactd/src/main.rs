//! Entrypoint for the network actuation daemon.
//!
//! Configuration is resolved from defaults, an optional file, `NETACT_*`
//! environment variables and command-line flags before the listener starts.

use std::io;
use std::process::ExitCode;

use netactd::SystemConfigLoader;

fn main() -> ExitCode {
    netactd::run(&SystemConfigLoader, &mut io::stderr().lock())
}
