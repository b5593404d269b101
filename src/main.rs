use proxy_auth_healthcheck::app::{self, Outcome};
use proxy_auth_healthcheck::cli::Cli;
use proxy_auth_healthcheck::core::checker::{CurlProbeClient, KerberosTicketCommands};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let outcome = app::run(
        std::env::args_os(),
        Arc::new(CurlProbeClient::new()),
        Arc::new(KerberosTicketCommands::new()),
    )
    .await;

    match &outcome {
        Outcome::Help => Cli::print_help(),
        Outcome::Usage(e) => e.exit(),
        Outcome::Failed(message) => println!("{}", message),
        Outcome::Verdict { output, .. } => println!("{}", output),
    }

    if outcome.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
