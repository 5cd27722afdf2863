use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use wander_agents::{DefaultGuide, GuideConfig};
use wander_core::{Location, Message, PointOfInterest, StoryResponse};
use wander_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "wander")]
#[command(about = "Wander Guide CLI")]
struct Cli {
    /// Overpass JSON file to use instead of the live interpreter.
    #[arg(long, env = "WANDER_GEO_FIXTURE", global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Position {
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

impl Position {
    fn location(&self) -> Result<Location> {
        Location::new(self.lat, self.lon).context("invalid --lat/--lon")
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List points of interest around a position.
    Discover {
        #[command(flatten)]
        position: Position,
        #[arg(long)]
        radius: Option<u32>,
    },
    /// Discover and narrate in one go.
    Story {
        #[command(flatten)]
        position: Position,
    },
    /// Arrival message for a single place.
    Arrive {
        #[command(flatten)]
        position: Position,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "attraction")]
        kind: String,
        #[arg(long)]
        distance: Option<f64>,
    },
    /// Interactive walk: story, arrival and follow-up questions.
    Chat {
        #[command(flatten)]
        position: Position,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wander_cli");
    let cli = Cli::parse();

    let mut config = GuideConfig::from_env().context("invalid guide configuration")?;
    if cli.fixture.is_some() {
        config.geo_fixture = cli.fixture.clone();
    }
    let guide = DefaultGuide::from_config(&config, AppMetrics::shared())?;

    match cli.command {
        Command::Discover { position, radius } => {
            let max_radius_m = guide.discovery_config().max_radius_m;
            if let Some(radius) = radius {
                if !guide.discovery_config().accepts_initial_radius(radius) {
                    bail!("--radius must be between 1 and {max_radius_m} meters");
                }
            }
            let discovery = guide.discover(position.location()?, radius).await;
            println!("{}", serde_json::to_string_pretty(&discovery.pois)?);
        }
        Command::Story { position } => {
            let exploration = guide.explore(position.location()?, &[]).await;
            match exploration.narrative {
                Some(narrative) => println!("{}", serde_json::to_string_pretty(&narrative.story)?),
                None => println!("No points of interest found nearby."),
            }
        }
        Command::Arrive {
            position,
            name,
            kind,
            distance,
        } => {
            let location = position.location()?;
            let poi = PointOfInterest {
                id: format!("manual/{:.5},{:.5}", location.latitude, location.longitude),
                name,
                kind,
                latitude: location.latitude,
                longitude: location.longitude,
                distance,
                description: None,
            };
            let report = guide.arrive(&poi).await;
            println!("{}", report.message);
        }
        Command::Chat { position } => run_chat(guide, position.location()?).await?,
    }

    Ok(())
}

async fn run_chat(guide: DefaultGuide, start: Location) -> Result<()> {
    println!("Wander Guide chat mode. type 'arrived' at a destination, 'more' to look around again, 'exit' to quit.");

    let mut location = start;
    let mut pois: Vec<PointOfInterest> = Vec::new();
    let mut next: Option<PointOfInterest> = None;
    let mut history: Vec<Message> = Vec::new();

    explore_from(&guide, location, &mut pois, &mut next, &mut history).await;

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }
        if message.is_empty() {
            continue;
        }

        if message.eq_ignore_ascii_case("arrived") {
            let Some(destination) = next.take() else {
                println!("\nThere is no destination yet. Try 'more'.\n");
                continue;
            };
            let report = guide.arrive(&destination).await;
            println!("\n{}\n", report.message);
            history.push(Message::assistant(report.message));
            location = destination.location();
            continue;
        }

        if message.eq_ignore_ascii_case("more") {
            history.clear();
            explore_from(&guide, location, &mut pois, &mut next, &mut history).await;
            continue;
        }

        if pois.is_empty() {
            println!("\nI don't know any places around here yet. Try 'more'.\n");
            continue;
        }

        history.push(Message::user(message));
        match guide.story(&pois, &history).await {
            Ok(narrative) => show_story(&narrative.story, &mut next, &mut history),
            Err(error) => println!("\n{error}\n"),
        }
    }

    Ok(())
}

async fn explore_from(
    guide: &DefaultGuide,
    location: Location,
    pois: &mut Vec<PointOfInterest>,
    next: &mut Option<PointOfInterest>,
    history: &mut Vec<Message>,
) {
    let exploration = guide.explore(location, history).await;
    *pois = exploration.discovery.pois;

    match exploration.narrative {
        Some(narrative) => show_story(&narrative.story, next, history),
        None => println!("\nNo points of interest found nearby. Walk a bit and try 'more'.\n"),
    }
}

fn show_story(
    story: &StoryResponse,
    next: &mut Option<PointOfInterest>,
    history: &mut Vec<Message>,
) {
    println!("\n{}\n", story.story);
    println!(
        "Next destination: {} ({}m)\n",
        story.next_destination.name,
        story.next_destination.distance_label()
    );
    history.push(Message::assistant(story.story.clone()));
    *next = Some(story.next_destination.clone());
}
