use identity_service::bootstrap::{self, StartupError};
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    let service = match bootstrap::initialize() {
        Ok(service) => service,
        Err(StartupError::Args(e)) => e.exit(),
        Err(e) => {
            eprintln!("could not initialize config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    bootstrap::install_tracing();

    info!(
        config = ?service.config.loaded_path(),
        level = %service.logger.level(),
        format = service.logger.format().as_str(),
        "Starting the service..."
    );

    ExitCode::SUCCESS
}
