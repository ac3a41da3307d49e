use clap::Parser;
use mlhub_cli::Mlhub;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mlhub = Mlhub::parse();
    match mlhub.run(true) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}
