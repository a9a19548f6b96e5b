use anyhow::Result;
use chrono::Duration as ChronoDuration;
use clap::{Parser, Subcommand};
use flightdeck_cli::replay::{replay, ReplayOptions};
use flightdeck_cli::source::SessionSource;
use flightdeck_cli::FlightdeckClient;
use flightdeck_core::{
    prepare_chart_series, ChartOptions, GapFill, Metric, MockFlight, PlaybackSpeed, Timecode, Timestamped,
    DEFAULT_CLUSTER_THRESHOLD_SECS, DEFAULT_MAX_POINTS,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect, replay and drive drone flight timelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a generated flight session as JSON
    Mock {
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Flight length as HH:MM:SS
        #[arg(long)]
        duration: Option<Timecode>,
    },

    /// Group timeline events that sit close together
    Clusters {
        #[command(flatten)]
        source: SessionSource,

        /// Max gap in seconds between neighbouring events of one cluster
        #[arg(long, default_value_t = DEFAULT_CLUSTER_THRESHOLD_SECS)]
        threshold: u64,
    },

    /// Print a telemetry series prepared for charting
    Series {
        #[command(flatten)]
        source: SessionSource,

        /// battery, altitude, horizontal_speed, vertical_speed or signal
        #[arg(long)]
        metric: Metric,

        #[arg(long, default_value_t = DEFAULT_MAX_POINTS)]
        max_points: usize,

        /// Skip interpolating across dropouts
        #[arg(long)]
        no_fill: bool,
    },

    /// Replay a session in the terminal in real time
    Replay {
        #[command(flatten)]
        source: SessionSource,

        /// 1, 1.5 or 2
        #[arg(long, default_value_t = 1.0)]
        speed: f64,

        #[arg(long, default_value = "00:00:00")]
        from: Timecode,

        #[arg(long)]
        until: Option<Timecode>,
    },

    /// Drive playback on a running server
    Remote {
        /// Flightdeck Server URL
        #[arg(long, env = "FLIGHTDECK_URL", default_value = "http://localhost:3000")]
        url: String,

        #[command(subcommand)]
        action: RemoteAction,
    },
}

#[derive(Subcommand, Debug)]
enum RemoteAction {
    /// Create a mock session
    Create {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        duration: Option<Timecode>,
    },
    /// List hosted sessions
    List,
    /// Show a session's playback state
    Status { session: String },
    Toggle { session: String },
    /// Seek to HH:MM:SS
    Seek { session: String, position: String },
    SkipForward { session: String },
    SkipBackward { session: String },
    NextEvent { session: String },
    PreviousEvent { session: String },
    Speed { session: String, speed: f64 },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Mock { seed, duration } => {
            let mut flight = MockFlight::new(seed);
            if let Some(duration) = duration {
                flight = flight.duration(duration);
            }
            print_json(&flight.generate())?;
        }

        Command::Clusters { source, threshold } => {
            let session = source.load()?;
            for cluster in session.clusters(threshold) {
                let at = Timecode::from_secs(cluster.position.round() as u64);
                if cluster.is_cluster() {
                    let (first, last) = cluster.span();
                    println!("{}  cluster of {} (span {}s)", at, cluster.len(), last - first);
                    for event in &cluster.events {
                        println!("            {}  {}", event.timestamp(), event.label());
                    }
                } else {
                    for event in &cluster.events {
                        println!("{}  {}", event.timestamp(), event.label());
                    }
                }
            }
        }

        Command::Series {
            source,
            metric,
            max_points,
            no_fill,
        } => {
            let session = source.load()?;
            let Some(series) = session.series(metric) else {
                anyhow::bail!("session has no {} telemetry", metric);
            };
            let options = ChartOptions {
                gap_fill: (!no_fill).then(GapFill::default),
                max_points,
            };
            let prepared = prepare_chart_series(series, &options);
            tracing::info!(
                "{}: {} points reduced to {}",
                metric,
                series.points.len(),
                prepared.points.len()
            );
            print_json(&prepared)?;
        }

        Command::Replay {
            source,
            speed,
            from,
            until,
        } => {
            let session = source.load()?;
            let options = ReplayOptions {
                from,
                until,
                speed: PlaybackSpeed::try_from(speed)?,
            };
            println!(
                "Replaying {} ({}) from {} at {}x",
                session.flight_id, session.duration, from, speed
            );
            let started_at = session.started_at;
            let end = replay(&session, options, |frame| {
                let wall = started_at + ChronoDuration::seconds(frame.position.as_secs() as i64);
                let location = frame
                    .location
                    .map(|p| format!("{:.5},{:.5} {:>5.1}m", p.lat, p.lon, p.altitude_m))
                    .unwrap_or_default();
                println!(
                    "{} {} {:>5.1}% {:<10} {}",
                    frame.position,
                    wall.format("%H:%M:%S"),
                    frame.progress * 100.0,
                    frame.phase.as_deref().unwrap_or("-"),
                    location
                );
                for event in &frame.events {
                    println!("         > {}", event.label());
                }
            })
            .await;
            println!("Stopped at {}", end);
        }

        Command::Remote { url, action } => {
            let client = FlightdeckClient::new(url);
            run_remote(&client, action).await?;
        }
    }

    Ok(())
}

async fn run_remote(client: &FlightdeckClient, action: RemoteAction) -> Result<()> {
    let snapshot = match action {
        RemoteAction::Create { seed, duration } => {
            let created = client.create_mock_session(seed, duration).await?;
            println!(
                "Created session {} for {} ({})",
                created.session_id, created.flight_id, created.duration
            );
            return Ok(());
        }
        RemoteAction::List => return print_json(&client.list_sessions().await?),
        RemoteAction::Status { session } => client.playback(&session).await?,
        RemoteAction::Toggle { session } => client.toggle(&session).await?,
        RemoteAction::Seek { session, position } => client.seek(&session, &position).await?,
        RemoteAction::SkipForward { session } => client.skip_forward(&session).await?,
        RemoteAction::SkipBackward { session } => client.skip_backward(&session).await?,
        RemoteAction::NextEvent { session } => client.next_event(&session).await?,
        RemoteAction::PreviousEvent { session } => client.previous_event(&session).await?,
        RemoteAction::Speed { session, speed } => client.set_speed(&session, speed).await?,
    };

    println!(
        "{} / {}  {:?}  {}x{}",
        snapshot.position,
        snapshot.duration,
        snapshot.status,
        snapshot.speed.factor(),
        if snapshot.is_jumping { "  (jumped)" } else { "" }
    );
    Ok(())
}
