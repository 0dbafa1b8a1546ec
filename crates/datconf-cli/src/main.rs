use std::process::ExitCode;

fn main() -> ExitCode {
    datconf_cli::run()
}
