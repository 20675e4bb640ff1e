use std::process::ExitCode;

fn main() -> ExitCode {
    tub_audit::cli::run()
}
