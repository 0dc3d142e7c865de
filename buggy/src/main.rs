use std::{env, io, process::ExitCode};

use buggy::{BUFFER_CAPACITY, CopyMode};

fn main() -> ExitCode {
    env_logger::init();

    let mut stdout = io::stdout().lock();
    let args = env::args_os().collect();
    match buggy::run::<BUFFER_CAPACITY, _>(CopyMode::Unchecked, args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
