use std::process::ExitCode;

fn main() -> ExitCode {
    roulette_cli::run()
}
