use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::api::{CardSource, KaitenClient, NewCard};
use crate::config;
use crate::download::{download_card_tree, DownloadOptions, DEFAULT_MAX_DEPTH};
use crate::input::resolve_card_input;
use crate::markdown::render_card;

/// Dispatch a subcommand. `args` excludes the program name.
pub async fn run(args: &[String]) -> Result<()> {
    let Some((command, rest)) = args.split_first() else {
        print_help();
        return Ok(());
    };
    if rest.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    match command.as_str() {
        "create-space" => handle_create_space(rest).await,
        "create-board" => handle_create_board(rest).await,
        "create-column" => handle_create_column(rest).await,
        "create-card" => handle_create_card(rest).await,
        "delete-space" | "delete-board" | "delete-column" | "delete-card" => {
            handle_delete(command, rest).await
        }
        "download" => handle_download(rest).await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => bail!("unknown command '{other}'; run 'kaiten help' for usage"),
    }
}

/// Flags shared across subcommands; each handler validates its positionals.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedArgs {
    pub positionals: Vec<String>,
    pub token: Option<String>,
    pub output_dir: Option<String>,
    pub stdout_only: bool,
    pub recursive: bool,
    pub max_depth: Option<usize>,
    pub skip_files: bool,
    pub column_id: Option<i64>,
    pub lane_id: Option<i64>,
    pub description: Option<String>,
}

pub fn parse_args(args: &[String]) -> Result<ParsedArgs> {
    let mut parsed = ParsedArgs::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--token" => parsed.token = Some(take_value(args, &mut i, "--token")?),
            "--output-dir" => parsed.output_dir = Some(take_value(args, &mut i, "--output-dir")?),
            "--stdout-only" => parsed.stdout_only = true,
            "--recursive" => parsed.recursive = true,
            "--skip-files-download" => parsed.skip_files = true,
            "--max-depth" => {
                let value = take_value(args, &mut i, "--max-depth")?;
                parsed.max_depth = Some(
                    value
                        .parse()
                        .with_context(|| format!("--max-depth expects a number, got '{value}'"))?,
                );
            }
            "--column-id" => {
                let value = take_value(args, &mut i, "--column-id")?;
                parsed.column_id = Some(
                    value
                        .parse()
                        .with_context(|| format!("--column-id expects a number, got '{value}'"))?,
                );
            }
            "--lane-id" => {
                let value = take_value(args, &mut i, "--lane-id")?;
                parsed.lane_id = Some(
                    value
                        .parse()
                        .with_context(|| format!("--lane-id expects a number, got '{value}'"))?,
                );
            }
            "-d" | "--description" => {
                parsed.description = Some(take_value(args, &mut i, "--description")?)
            }
            flag if flag.starts_with("--") => bail!("unknown flag '{flag}'"),
            _ => parsed.positionals.push(args[i].clone()),
        }
        i += 1;
    }
    Ok(parsed)
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .with_context(|| format!("Missing value for {flag} flag"))
}

fn parse_id(raw: &str, what: &str) -> Result<i64> {
    raw.parse()
        .with_context(|| format!("{what} must be numeric, got '{raw}'"))
}

/// Build a client from config + env, requiring a configured base URL.
fn client_from_config(token_override: Option<String>) -> Result<KaitenClient> {
    let config = config::load_config()?;
    let base_url = config.base_url.context(
        "no API base URL configured; set KAITEN_API_BASE_URL or base_url in ~/.kaiten/config.toml",
    )?;
    Ok(KaitenClient::new(
        base_url,
        token_override.or(config.api_token),
    ))
}

/// Print a created entity, or write its JSON to the trailing output file.
fn report_created<T: Serialize>(
    entity: &T,
    summary: String,
    output_file: Option<&str>,
) -> Result<()> {
    match output_file {
        Some(path) => {
            let json = serde_json::to_string_pretty(entity)?;
            std::fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
            println!("{summary} -> {path}");
        }
        None => println!("{summary}"),
    }
    Ok(())
}

fn id_str(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "?".into())
}

async fn handle_create_space(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let (name, output_file) = match parsed.positionals.as_slice() {
        [name] => (name, None),
        [name, out] => (name, Some(out.as_str())),
        _ => bail!("Usage: kaiten create-space <name> [output-file]"),
    };
    let client = client_from_config(parsed.token)?;
    let space = client.create_space(name).await?;
    report_created(
        &space,
        format!("Created space {}: {}", id_str(space.id), space.title),
        output_file,
    )
}

async fn handle_create_board(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let (space_id, name, output_file) = match parsed.positionals.as_slice() {
        [space_id, name] => (space_id, name, None),
        [space_id, name, out] => (space_id, name, Some(out.as_str())),
        _ => bail!("Usage: kaiten create-board <space-id> <name> [output-file]"),
    };
    let space_id = parse_id(space_id, "space-id")?;
    let client = client_from_config(parsed.token)?;
    let board = client.create_board(space_id, name).await?;
    report_created(
        &board,
        format!("Created board {}: {}", id_str(board.id), board.title),
        output_file,
    )
}

async fn handle_create_column(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let (board_id, name, output_file) = match parsed.positionals.as_slice() {
        [board_id, name] => (board_id, name, None),
        [board_id, name, out] => (board_id, name, Some(out.as_str())),
        _ => bail!("Usage: kaiten create-column <board-id> <name> [output-file]"),
    };
    let board_id = parse_id(board_id, "board-id")?;
    let client = client_from_config(parsed.token)?;
    let column = client.create_column(board_id, name).await?;
    report_created(
        &column,
        format!("Created column {}: {}", id_str(column.id), column.title),
        output_file,
    )
}

async fn handle_create_card(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let (board_id, title, output_file) = match parsed.positionals.as_slice() {
        [board_id, title] => (board_id, title, None),
        [board_id, title, out] => (board_id, title, Some(out.as_str())),
        _ => bail!(
            "Usage: kaiten create-card <board-id> <title> [output-file] [--column-id <id>] [--lane-id <id>] [-d <description>]"
        ),
    };
    let board_id = parse_id(board_id, "board-id")?;
    let client = client_from_config(parsed.token)?;
    let card = client
        .create_card(NewCard {
            board_id,
            title: title.clone(),
            column_id: parsed.column_id,
            lane_id: parsed.lane_id,
            description: parsed.description,
        })
        .await?;
    report_created(
        &card,
        format!("Created card {}: {}", card.id, card.title),
        output_file,
    )
}

async fn handle_delete(command: &str, args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let [id] = parsed.positionals.as_slice() else {
        bail!("Usage: kaiten {command} <id>");
    };
    let id = parse_id(id, "id")?;
    let client = client_from_config(parsed.token)?;
    match command {
        "delete-space" => client.delete_space(id).await?,
        "delete-board" => client.delete_board(id).await?,
        "delete-column" => client.delete_column(id).await?,
        _ => client.delete_card(id).await?,
    }
    println!("Deleted {}", command.trim_start_matches("delete-"));
    Ok(())
}

async fn handle_download(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let [input] = parsed.positionals.as_slice() else {
        bail!("Usage: kaiten download <card-id-or-url> [--output-dir <dir>] [--stdout-only] [--recursive] [--max-depth <n>] [--skip-files-download]");
    };

    let config = config::load_config()?;
    let (card_id, base_url) = resolve_card_input(input, config.base_url.as_deref())?;
    let client = KaitenClient::new(base_url, parsed.token.or(config.api_token));

    if parsed.stdout_only {
        let card = client.get_card(card_id).await?;
        let comments = client.get_card_comments(card_id).await?;
        let children = if card.children_count > 0 {
            client.get_card_children(card_id).await?
        } else {
            Vec::new()
        };
        print!("{}", render_card(&card, &comments, &children));
        return Ok(());
    }

    let output_dir = PathBuf::from(parsed.output_dir.unwrap_or_else(|| ".".into()));
    let options = DownloadOptions {
        max_depth: if parsed.recursive {
            parsed.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
        } else {
            0
        },
        skip_files: parsed.skip_files,
    };
    let tree = download_card_tree(&client, card_id, &output_dir, &options).await?;
    println!(
        "Downloaded card {} to {}",
        tree.card.id,
        output_dir.join(card_id.to_string()).display()
    );
    Ok(())
}

pub fn print_help() {
    println!("kaiten — Kaiten board and card utilities\n");
    println!("USAGE:");
    println!("  kaiten create-space <name> [output-file]");
    println!("  kaiten create-board <space-id> <name> [output-file]");
    println!("  kaiten create-column <board-id> <name> [output-file]");
    println!("  kaiten create-card <board-id> <title> [output-file]");
    println!("  kaiten delete-space|delete-board|delete-column|delete-card <id>");
    println!("  kaiten download <card-id-or-url>");
    println!();
    println!("CREATE-CARD OPTIONS:");
    println!("  --column-id <id>       Place the card in a specific column (default: first)");
    println!("  --lane-id <id>         Place the card in a specific lane (default: first)");
    println!("  -d, --description <t>  Card description");
    println!();
    println!("DOWNLOAD OPTIONS:");
    println!("  --output-dir <dir>     Where to write the card tree (default: current dir)");
    println!("  --stdout-only          Print Markdown instead of writing files");
    println!("  --recursive            Also download child cards");
    println!("  --max-depth <n>        Recursion bound for --recursive (default: 3)");
    println!("  --skip-files-download  Do not download attachments");
    println!();
    println!("COMMON OPTIONS:");
    println!("  --token <token>        Override KAITEN_API_TOKEN / config token");
    println!();
    println!("ENVIRONMENT:");
    println!("  KAITEN_API_TOKEN       Bearer token for the API");
    println!("  KAITEN_API_BASE_URL    API root, e.g. https://acme.kaiten.ru/api/v1");
}
