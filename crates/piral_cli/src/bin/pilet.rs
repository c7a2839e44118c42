use std::process::ExitCode;

use piral_core::View;

fn main() -> ExitCode {
    piral_cli::main_for(View::Pilet)
}
