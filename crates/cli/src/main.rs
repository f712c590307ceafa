mod cli;
mod commands;

fn main() {
    // Set up error handling first
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    init_tracing();

    // Run the CLI and handle any errors with enhanced reporting
    if let Err(error) = commands::run(cli::parse()) {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

/// Diagnostics go to stderr; stdout carries only command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
