//! `docwords-ls`: cross-document word completion over LSP (stdio).
//!
//! Logging goes to stderr; set `DOCWORDS_LOG` (e.g. `docwords_core=debug`) to change the filter.

use docwords_lsp::Server;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env("DOCWORDS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let mut reader = io::stdin().lock();
    let mut writer = io::stdout().lock();
    let mut server = Server::new();
    match server.run(&mut reader, &mut writer) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            tracing::error!(error = %err, "transport failure");
            ExitCode::FAILURE
        }
    }
}
