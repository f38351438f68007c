use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = drug_lookup::cli::Cli::parse();
    match drug_lookup::cli::run(cli).await {
        Ok(output) => {
            if !output.text.is_empty() {
                println!("{}", output.text.trim_end());
            }
            if output.success {
                std::process::ExitCode::SUCCESS
            } else {
                std::process::ExitCode::from(1)
            }
        }
        Err(err) => {
            if let Some(lookup_err) = err.downcast_ref::<drug_lookup::error::DrugLookupError>() {
                eprintln!("Error: {lookup_err}");
            } else {
                eprintln!("Error: {err}");
            }
            std::process::ExitCode::from(1)
        }
    }
}
