use faultline_stub::{StubState, serve};

const LISTEN_ENV: &str = "FAULTLINE_STUB_LISTEN";
const DEFAULT_LISTEN: &str = "127.0.0.1:8081";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var(LISTEN_ENV).unwrap_or_else(|_| DEFAULT_LISTEN.into());
    if let Err(err) = serve(&addr, StubState::new()).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
