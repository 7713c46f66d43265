//! kubequery (kq) - natural-language Kubernetes operations

use anyhow::Result;
use clap::Parser;
use kubequery::cli::{Cli, Command, OutputFormat, QueryArgs};
use kubequery::config::load_config;
use kubequery::handler::{self, AppContext};
use kubequery::{output, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    setup_tracing(cli.verbose);

    // Handle color settings
    if cli.no_color {
        owo_colors::set_override(false);
    }

    // Execute command
    let result = match cli.command {
        Command::Query(ref args) => run_query(&cli, args).await,
        Command::Serve(ref args) => run_serve(&cli, args.port).await,
        Command::Completions(ref args) => {
            generate_completions(args.shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run_query(cli: &Cli, args: &QueryArgs) -> kubequery::error::Result<()> {
    let config = load_config()?;
    let ctx = AppContext::new(cli.context.as_deref(), &config).await?;

    let prompt = args.prompt.join(" ");
    let response = handler::handle(&ctx, &prompt).await?;

    let rendered = match cli.output {
        OutputFormat::Table => output::format_response(&response),
        OutputFormat::Json => output::format_json(&response)?,
    };
    println!("{}", rendered);

    Ok(())
}

async fn run_serve(cli: &Cli, port: u16) -> kubequery::error::Result<()> {
    let config = load_config()?;
    let ctx = AppContext::new(cli.context.as_deref(), &config).await?;
    server::start_server(ctx, port).await
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "kq", &mut std::io::stdout());
}
