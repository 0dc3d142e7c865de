use std::{env, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(
    about = "Execs the buggy target with the contents of a file as its argument",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Args {
    /// File whose contents become the target's only argument, even when it
    /// starts with a dash
    #[arg(allow_hyphen_values = true)]
    input_file: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();

    let program = env::args_os()
        .next()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "runner".to_owned());

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(_) => {
            eprintln!("Usage: {program} <input_file>");
            return ExitCode::FAILURE;
        }
    };

    let argument = match runner::read_input(&args.input_file) {
        Ok(argument) => argument,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let target = runner::target_path();
    info!("handing {} over to {}", args.input_file.display(), target.display());

    // Only comes back if the exec failed
    let Err(e) = runner::exec_target(&target, &argument);
    eprintln!("{e}");
    drop(argument);
    ExitCode::FAILURE
}
