use std::io;

fn main() {
    if let Err(e) = tactica_cli::init_logging_from_env() {
        eprintln!("Failed to initialize logging: {}", e);
    }
    let code = tactica_cli::run(std::env::args(), &mut io::stdout(), &mut io::stderr());
    std::process::exit(code);
}
