use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use facet::Facet;
use faultline_layout::layout;
use faultline_types::decode_snapshot;
use faultline_view::command::{COMMAND_HELP, parse_command};
use faultline_view::{
    Command, FetchHint, HttpSnapshotClient, RenderSurface, SystemClock, TemporalController,
    TextSurface, ViewConfig, ViewLoop, ViewSession,
};
use figue as args;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Facet, Debug)]
struct Cli {
    #[facet(flatten)]
    builtins: args::FigueBuiltins,
    #[facet(args::subcommand)]
    command: CliCommand,
}

#[derive(Facet, Debug)]
#[repr(u8)]
enum CliCommand {
    /// Follow the live graph and scrub through time interactively.
    Watch {
        #[facet(args::named, default)]
        url: Option<String>,
        #[facet(args::named, default)]
        poll_ms: Option<u64>,
        #[facet(args::named, default)]
        window_ms: Option<u64>,
    },
    /// Show the graph at one instant.
    At {
        #[facet(args::named)]
        timestamp: i64,
        #[facet(args::named, default)]
        url: Option<String>,
        #[facet(args::named, default)]
        raw: bool,
    },
    /// Print positioned nodes and edges for a snapshot JSON file.
    Layout {
        #[facet(args::named)]
        file: String,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = parse_cli()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = ViewConfig::from_env()?;
    match cli.command {
        CliCommand::Watch {
            url,
            poll_ms,
            window_ms,
        } => {
            if let Some(url) = url {
                config.base_url = url;
            }
            if let Some(poll_ms) = poll_ms {
                config.poll_ms = poll_ms;
            }
            if let Some(window_ms) = window_ms {
                config.window_ms = window_ms;
            }
            config.validate()?;
            run_watch(config)
        }
        CliCommand::At {
            timestamp,
            url,
            raw,
        } => {
            if let Some(url) = url {
                config.base_url = url;
            }
            config.validate()?;
            run_at(&config, timestamp, raw)
        }
        CliCommand::Layout { file } => run_layout(PathBuf::from(file)),
    }
}

fn parse_cli() -> Result<Cli, String> {
    let figue_config = args::builder::<Cli>()
        .map_err(|e| format!("failed to build CLI schema: {e}"))?
        .cli(|cli| cli.strict())
        .help(|h| {
            h.program_name("faultline")
                .description("Live and historical service dependency graph viewer")
                .version(option_env!("CARGO_PKG_VERSION").unwrap_or("dev"))
        })
        .build();
    let cli = args::Driver::new(figue_config)
        .run()
        .into_result()
        .map_err(|e| e.to_string())?;
    Ok(cli.value)
}

fn run_watch(config: ViewConfig) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build tokio runtime: {e}"))?;

    let (commands, rx) = mpsc::unbounded_channel();
    spawn_stdin_reader(commands, config.step_span());
    info!(url = %config.base_url, poll_ms = config.poll_ms, "watching");
    eprintln!("{COMMAND_HELP}");

    runtime.block_on(async {
        let source = Arc::new(HttpSnapshotClient::new(
            config.base_url.clone(),
            config.timeout(),
        ));
        let surface = TextSurface::with_clear_screen(std::io::stdout());
        ViewLoop::new(&config, source, Arc::new(SystemClock), surface)?
            .run(rx)
            .await
            .map(drop)
            .map_err(|e| format!("failed to render: {e}"))
    })
}

/// Forwards parsed stdin lines to the loop; end of input quits.
fn spawn_stdin_reader(commands: mpsc::UnboundedSender<Command>, step_ms: i64) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line, step_ms) {
                Ok(Some(command)) => {
                    let quit = command == Command::Shutdown;
                    if commands.send(command).is_err() || quit {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => eprintln!("{err}"),
            }
        }
        let _ = commands.send(Command::Shutdown);
    });
}

fn run_at(config: &ViewConfig, timestamp: i64, raw: bool) -> Result<(), String> {
    let client = HttpSnapshotClient::new(config.base_url.clone(), config.timeout());
    let hint = FetchHint::Exact(timestamp);

    if raw {
        let body = client.fetch_raw_blocking(hint).map_err(|e| e.to_string())?;
        let pretty = facet_json::to_string_pretty(
            &facet_json::from_str::<facet_value::Value>(&body)
                .map_err(|e| format!("decode graph response as json: {e}"))?,
        )
        .map_err(|e| format!("pretty graph response: {e}"))?;
        println!("{pretty}");
        return Ok(());
    }

    let snapshot = client.fetch_blocking(hint).map_err(|e| e.to_string())?;
    let mut session = ViewSession::default();
    session
        .apply_snapshot(snapshot)
        .map_err(|e| format!("layout snapshot at {timestamp}: {e}"))?;

    let mut controller = TemporalController::new(timestamp, config.window_span());
    controller.set_cursor(timestamp);
    TextSurface::new(std::io::stdout())
        .render(&session.view(controller.state()))
        .map_err(|e| format!("failed to render: {e}"))
}

fn run_layout(path: PathBuf) -> Result<(), String> {
    let body = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let snapshot = decode_snapshot(&body).map_err(|e| format!("{}: {e}", path.display()))?;
    let graph = layout(snapshot.nodes(), snapshot.edges())
        .map_err(|e| format!("layout {}: {e}", path.display()))?;
    println!(
        "{}",
        facet_json::to_string_pretty(&graph).map_err(|e| format!("encode layout: {e}"))?
    );
    Ok(())
}
