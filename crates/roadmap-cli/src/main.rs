//! `roadmapctl`: drive the roadmap engine against a JSON snapshot store

mod cli;

use anyhow::{Context, Result};
use clap::ArgMatches;
use roadmap_core::prelude::*;
use roadmap_core::{ListQuery, ProgressHub, ProgressSink, SubscriberId};
use roadmap_oracle::OpenAiOracle;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn init_logging(verbosity: u8, json: bool) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    Ok(config.with_env_overrides())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn actor(args: &ArgMatches) -> Actor {
    let id = args.get_one::<UserId>("user").copied().unwrap_or_default();
    if args.get_flag("admin") {
        Actor::admin(id)
    } else {
        Actor::user(id)
    }
}

fn roadmap_id(args: &ArgMatches) -> Result<RoadmapId> {
    args.get_one::<RoadmapId>("roadmap")
        .copied()
        .context("missing roadmap id")
}

struct App {
    engine: RoadmapEngine,
    store: Arc<MemoryStore>,
    store_path: PathBuf,
    hub: Arc<ProgressHub>,
}

impl App {
    fn open(matches: &ArgMatches) -> Result<Self> {
        let store_path = matches
            .get_one::<PathBuf>("store")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("roadmaps.json"));
        let config = load_config(matches.get_one::<PathBuf>("config"))?;

        let store = Arc::new(MemoryStore::load(&store_path)?);
        let oracle = Arc::new(OpenAiOracle::new(config.oracle.clone())?);
        let hub = Arc::new(ProgressHub::new());
        let sink: Arc<dyn ProgressSink> = Arc::clone(&hub) as _;
        let engine = RoadmapEngine::with_progress(config, Arc::clone(&store) as _, oracle, sink)?;

        Ok(Self {
            engine,
            store,
            store_path,
            hub,
        })
    }

    fn save(&self) -> Result<()> {
        save_snapshot(&self.store, &self.store_path)
    }

    async fn run(&self, name: &str, args: &ArgMatches) -> Result<()> {
        let engine = &self.engine;
        match name {
            "seed" => {
                if args.get_flag("clear") {
                    let removed = engine.seeder().clear_pre_generated().await?;
                    info!(removed, "cleared pre-generated roadmaps");
                }
                let report = engine.seeder().seed_popular().await?;
                self.save()?;
                print_json(&report)
            }
            "generate" => {
                let prompt = args.get_one::<String>("prompt").context("missing prompt")?;
                let mut request = GenerateRequest::new(prompt.as_str()).community(args.get_flag("community"));
                if let Some(user) = args.get_one::<UserId>("user") {
                    request = request.by(*user);
                }
                let printer = if args.get_flag("progress") {
                    let id = SubscriberId::new("cli");
                    request = request.with_subscriber(id.clone());
                    Some(self.print_progress(id))
                } else {
                    None
                };

                let outcome = engine.generate(request).await;
                if let Some(printer) = printer {
                    let _ = printer.await;
                }
                let outcome = outcome?;
                self.save()?;
                print_json(&outcome)
            }
            "search" => {
                let query = args.get_one::<String>("query").context("missing query")?;
                let threshold = args
                    .get_one::<f64>("threshold")
                    .copied()
                    .unwrap_or(engine.config().search.search_threshold);
                let hits = engine.lookup().similar(query, threshold).await?;
                let rows: Vec<_> = hits
                    .iter()
                    .map(|hit| {
                        serde_json::json!({
                            "id": hit.roadmap.id,
                            "title": hit.roadmap.title,
                            "similarity": hit.similarity,
                            "needsRegeneration": hit.roadmap.needs_regeneration,
                        })
                    })
                    .collect();
                print_json(&rows)
            }
            "vote" => {
                let id = roadmap_id(args)?;
                let vote = match args.get_one::<String>("direction").map(String::as_str) {
                    Some("up") => Vote::Up,
                    _ => Vote::Down,
                };
                let voter = args.get_one::<UserId>("user").copied().unwrap_or_default();
                let tally = engine.vote(id, voter, vote).await?;
                self.save()?;
                print_json(&tally)
            }
            "regenerate" => {
                let report = engine.regenerate(roadmap_id(args)?, &actor(args)).await?;
                self.save()?;
                print_json(&report)
            }
            "show" => print_json(&engine.catalog().detail(roadmap_id(args)?).await?),
            "list" => {
                let query = ListQuery {
                    page: args.get_one::<usize>("page").copied().unwrap_or(1),
                    limit: args.get_one::<usize>("limit").copied().unwrap_or(0),
                    category: args.get_one::<Category>("category").copied(),
                    difficulty: args.get_one::<Difficulty>("difficulty").copied(),
                    search: args.get_one::<String>("search").cloned(),
                };
                print_json(&engine.catalog().list_published(&query).await?)
            }
            "popular" => {
                let limit = args.get_one::<usize>("limit").copied().unwrap_or(20);
                print_json(&engine.catalog().popular(limit).await?)
            }
            "stats" => print_json(&engine.catalog().category_stats().await?),
            "publish" => {
                let admin = Actor::admin(args.get_one::<UserId>("user").copied().unwrap_or_default());
                let roadmap = engine
                    .catalog()
                    .set_published(roadmap_id(args)?, &admin, !args.get_flag("unpublish"))
                    .await?;
                self.save()?;
                print_json(&roadmap)
            }
            "delete" => {
                let report = engine.catalog().delete(roadmap_id(args)?, &actor(args)).await?;
                self.save()?;
                print_json(&report)
            }
            other => anyhow::bail!("unknown command {other}"),
        }
    }

    /// Print events for `id` to stderr until a terminal event arrives
    fn print_progress(&self, id: SubscriberId) -> tokio::task::JoinHandle<()> {
        let mut rx = self.hub.subscribe(id);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match (&event.message, &event.error) {
                    (_, Some(error)) => eprintln!("[{:>3}%] {:?}: {error}", event.progress, event.step),
                    (Some(message), None) => eprintln!("[{:>3}%] {message}", event.progress),
                    (None, None) => eprintln!("[{:>3}%] {:?}", event.progress, event.step),
                }
                if event.is_terminal() {
                    break;
                }
            }
        })
    }
}

fn save_snapshot(store: &MemoryStore, path: &Path) -> Result<()> {
    store
        .save(path)
        .with_context(|| format!("saving snapshot to {}", path.display()))?;
    debug!(path = %path.display(), "snapshot saved");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::command().get_matches();
    init_logging(matches.get_count("verbose"), matches.get_flag("json-logs"));

    let app = App::open(&matches)?;
    match matches.subcommand() {
        Some((name, args)) => app.run(name, args).await,
        None => Ok(()),
    }
}
