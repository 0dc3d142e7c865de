// Same target, but the copy is checked the way a _FORTIFY_SOURCE build checks
// strcpy: an overflow aborts the process before a single byte is written.

use std::{
    env, io,
    process::{self, ExitCode},
};

use buggy::{BUFFER_CAPACITY, CopyMode, TargetError};
use log::debug;

fn main() -> ExitCode {
    env_logger::init();

    let mut stdout = io::stdout().lock();
    let args = env::args_os().collect();
    match buggy::run::<BUFFER_CAPACITY, _>(CopyMode::Fortified, args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(TargetError::Fortify(e)) => {
            debug!("{e}");
            eprintln!("*** buffer overflow detected ***: terminated");
            process::abort();
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
