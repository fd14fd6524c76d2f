use crate::CLAP_STYLING;
use clap::{Arg, arg, command, value_parser};
use std::path::PathBuf;
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("delver")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("delver")
        .about("Breadth-first and hybrid depth-first crawler for research")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").global(true))
        .arg(arg!(-v --"verbose" "Log frontier operations and skipped nodes").global(true))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("search")
                .about(
                    "Breadth-first crawl from the seed URLs, level by level, up to a depth and \
                page budget.",
                )
                .args(seed_args())
                .arg(
                    arg!(-d --"max-depth" <DEPTH>)
                        .required(false)
                        .help("Deepest level to fetch; seeds are depth 0")
                        .value_parser(value_parser!(usize))
                        .env("DELVER_SEARCH_MAX_DEPTH")
                        .default_value("2"),
                )
                .arg(
                    arg!(-p --"max-pages" <NUM>)
                        .required(false)
                        .help("Stop after this many pages have been crawled")
                        .value_parser(value_parser!(usize))
                        .env("DELVER_SEARCH_MAX_PAGES")
                        .default_value("25"),
                )
                .arg(
                    arg!(-l --"links-per-page" <NUM>)
                        .required(false)
                        .help("Links followed from each crawled page")
                        .value_parser(value_parser!(usize))
                        .env("DELVER_SEARCH_MAX_LINKS_PER_PAGE")
                        .default_value("5"),
                )
                .args(fetch_args())
                .args(output_args()),
        )
        .subcommand(
            command!("deep")
                .about(
                    "Collect seed pages breadth-first, then dive depth-first below each seed \
                until the page budget is spent.",
                )
                .args(seed_args())
                .arg(
                    arg!(--"bfs-pages" <NUM>)
                        .required(false)
                        .help("Seed pages collected by the breadth-first phase")
                        .value_parser(value_parser!(usize))
                        .env("DELVER_DEEP_BFS_PAGES")
                        .default_value("20"),
                )
                .arg(
                    arg!(--"dfs-depth" <DEPTH>)
                        .required(false)
                        .help("Levels explored below each seed")
                        .value_parser(value_parser!(usize))
                        .env("DELVER_DEEP_DFS_DEPTH")
                        .default_value("4"),
                )
                .arg(
                    arg!(-p --"max-pages" <NUM>)
                        .required(false)
                        .help("Global page budget across both phases")
                        .value_parser(value_parser!(usize))
                        .env("DELVER_DEEP_MAX_PAGES")
                        .default_value("50"),
                )
                .arg(
                    arg!(--"bfs-links" <NUM>)
                        .required(false)
                        .help("Links followed from each page in the breadth-first phase")
                        .value_parser(value_parser!(usize))
                        .env("DELVER_DEEP_MAX_LINKS_BFS")
                        .default_value("8"),
                )
                .arg(
                    arg!(--"dfs-links" <NUM>)
                        .required(false)
                        .help("Links followed from each page in the depth-first phase")
                        .value_parser(value_parser!(usize))
                        .env("DELVER_DEEP_MAX_LINKS_DFS")
                        .default_value("6"),
                )
                .args(fetch_args())
                .args(output_args()),
        )
}

fn seed_args() -> Vec<Arg> {
    vec![
        arg!(-u --"url" <URL>)
            .required(false)
            .help("A seed URL to crawl; repeat for several")
            .value_parser(value_parser!(Url))
            .action(clap::ArgAction::Append)
            .conflicts_with("hosts-file"),
        arg!(-H --"hosts-file" <PATH>)
            .required(false)
            .help("Path to a newline-delimited file of seed URLs")
            .value_parser(value_parser!(PathBuf))
            .conflicts_with("url"),
    ]
}

fn fetch_args() -> Vec<Arg> {
    vec![
        arg!(--"delay" <MILLISECONDS>)
            .required(false)
            .help("Pause before each fetch")
            .value_parser(value_parser!(u64))
            .env("DELVER_DELAY_MS")
            .default_value("1000"),
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Request timeout in seconds")
            .value_parser(value_parser!(u64))
            .env("DELVER_TIMEOUT")
            .default_value("10"),
        arg!(--"max-links" <NUM>)
            .required(false)
            .help("Links kept on each crawled page")
            .value_parser(value_parser!(usize))
            .env("DELVER_MAX_LINKS")
            .default_value("15"),
    ]
}

fn output_args() -> Vec<Arg> {
    vec![
        arg!(-f --"format" <FORMAT>)
            .required(false)
            .help("Report format: text, json, markdown")
            .value_parser(["text", "json", "markdown"])
            .default_value("text"),
        arg!(-o --"output" <PATH>)
            .required(false)
            .help("Save report to file (default: display to screen)")
            .value_parser(value_parser!(PathBuf)),
        arg!(--"graph" <PATH>)
            .required(false)
            .help("Write the crawl graph; .dot for Graphviz, anything else for JSON")
            .value_parser(value_parser!(PathBuf)),
    ]
}
