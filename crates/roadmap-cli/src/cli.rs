//! Command line definition

use clap::{value_parser, Arg, ArgAction, Command};
use roadmap_model::{Category, Difficulty, RoadmapId, UserId};
use std::path::PathBuf;

fn roadmap_arg() -> Arg {
    Arg::new("roadmap")
        .required(true)
        .value_parser(value_parser!(RoadmapId))
        .help("Roadmap id")
}

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .value_parser(value_parser!(UserId))
        .help("Acting user id; a fresh anonymous id when omitted")
}

fn admin_arg() -> Arg {
    Arg::new("admin")
        .long("admin")
        .action(ArgAction::SetTrue)
        .help("Act with administrator rights")
}

pub(crate) fn command() -> Command {
    Command::new("roadmapctl")
        .version(roadmap_core::VERSION)
        .about("Deduplicating learning-roadmap engine")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("store")
                .long("store")
                .env("ROADMAP_STORE")
                .default_value("roadmaps.json")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("JSON snapshot holding roadmaps, nodes and resources"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .env("ROADMAP_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("TOML engine configuration"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emit logs as JSON lines"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .subcommand(
            Command::new("seed")
                .about("Insert the popular pre-generated roadmaps")
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .action(ArgAction::SetTrue)
                        .help("Delete existing pre-generated roadmaps first"),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Return a cached roadmap or generate a new one")
                .arg(Arg::new("prompt").required(true).help("What to learn"))
                .arg(user_arg())
                .arg(
                    Arg::new("community")
                        .long("community")
                        .action(ArgAction::SetTrue)
                        .help("Contribute as community content owned by --user"),
                )
                .arg(
                    Arg::new("progress")
                        .long("progress")
                        .action(ArgAction::SetTrue)
                        .help("Print progress events to stderr"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Rank stored roadmaps by similarity to a query")
                .arg(Arg::new("query").required(true))
                .arg(
                    Arg::new("threshold")
                        .long("threshold")
                        .value_parser(value_parser!(f64))
                        .help("Minimum similarity; configured search threshold when omitted"),
                ),
        )
        .subcommand(
            Command::new("vote")
                .about("Toggle an up or down vote")
                .arg(roadmap_arg())
                .arg(
                    Arg::new("direction")
                        .required(true)
                        .value_parser(["up", "down"]),
                )
                .arg(user_arg()),
        )
        .subcommand(
            Command::new("regenerate")
                .about("Replace a roadmap's tree")
                .arg(roadmap_arg())
                .arg(user_arg())
                .arg(admin_arg()),
        )
        .subcommand(Command::new("show").about("Print a roadmap with its tree").arg(roadmap_arg()))
        .subcommand(
            Command::new("list")
                .about("Page through published roadmaps")
                .arg(
                    Arg::new("page")
                        .long("page")
                        .default_value("1")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .default_value("10")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .value_parser(value_parser!(Category)),
                )
                .arg(
                    Arg::new("difficulty")
                        .long("difficulty")
                        .value_parser(value_parser!(Difficulty)),
                )
                .arg(Arg::new("search").long("search").help("Title substring")),
        )
        .subcommand(
            Command::new("popular").about("Most viewed pre-generated roadmaps").arg(
                Arg::new("limit")
                    .long("limit")
                    .default_value("20")
                    .value_parser(value_parser!(usize)),
            ),
        )
        .subcommand(Command::new("stats").about("Published roadmaps per category"))
        .subcommand(
            Command::new("publish")
                .about("Publish or unpublish a roadmap (administrators)")
                .arg(roadmap_arg())
                .arg(user_arg())
                .arg(
                    Arg::new("unpublish")
                        .long("unpublish")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a roadmap with its nodes and resources")
                .arg(roadmap_arg())
                .arg(user_arg())
                .arg(admin_arg()),
        )
}
