use clap::Parser;
use classroom_quiz::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Origin allowed to open connections (overrides CLIENT_URL)
    #[arg(long)]
    client_url: Option<String>,

    /// Address to bind (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::from_env();
    if let Some(client_url) = args.client_url {
        config.client_url = Some(client_url);
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    if let Err(e) = classroom_quiz::server::run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
