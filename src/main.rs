use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    nobleart_booker::run().await
}
