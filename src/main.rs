use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use binary_log_decoder::app;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Decoded lines own stdout; diagnostics go to stderr, filtered by RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let code = app::run(std::env::args_os(), &mut out, &mut io::stderr());
    let _ = out.flush();
    ExitCode::from(code)
}
