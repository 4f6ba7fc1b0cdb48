use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    riven_cli::run().await
}
