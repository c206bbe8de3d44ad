mod cli;

use hail_core::core::signals;

fn main() {
    if let Err(e) = cli::run() {
        if e.downcast_ref::<signals::InterruptedError>().is_some() {
            std::process::exit(130);
        }
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}
