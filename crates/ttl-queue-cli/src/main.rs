use tracing::error;
use ttl_queue_cli::{run_cli, CliError};

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        error!("Load run failed: {}", e);

        let exit_code = match e {
            CliError::InvalidArgument { .. } => 1,
            CliError::Http(_) => 2,
            CliError::Task { .. } => 3,
        };

        std::process::exit(exit_code);
    }
}
