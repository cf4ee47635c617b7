use std::path::PathBuf;

pub const DEFAULT_CONFIG: &str = "sqlsketch.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Parse,
    Gen,
    Init,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Parse(ParseArgs),
    Gen(GenArgs),
    Init(InitArgs),
}

#[derive(Debug, Clone)]
pub struct ParseArgs {
    pub config: PathBuf,
    /// Explicit DDL files; when empty, `schema.files` from the config is used.
    pub files: Vec<PathBuf>,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct GenArgs {
    pub config: PathBuf,
    pub query: PathBuf,
    pub dry_run: bool,
    pub check: bool,
}

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub config: PathBuf,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" => Ok(Command::Help(HelpTopic::Root)),
        "parse" => parse_parse(it.map(|s| s.as_str())),
        "gen" => parse_gen(it.map(|s| s.as_str())),
        "init" => parse_init(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Handles `--config <FILE>` and `--config=<FILE>`. Returns `false` when the
/// token is not a config option.
fn take_config<'a>(
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
    config: &mut PathBuf,
) -> anyhow::Result<bool> {
    if token == "--config" {
        let Some(v) = it.next() else {
            anyhow::bail!("--config requires a value");
        };
        *config = PathBuf::from(v);
        return Ok(true);
    }
    if let Some(v) = token.strip_prefix("--config=") {
        *config = PathBuf::from(v);
        return Ok(true);
    }
    Ok(false)
}

fn parse_parse<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut files: Vec<PathBuf> = Vec::new();
    let mut json = false;

    while let Some(token) = it.next() {
        if take_config(token, &mut it, &mut config)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Parse)),
            "--json" => json = true,
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            file => files.push(PathBuf::from(file)),
        }
    }

    Ok(Command::Parse(ParseArgs {
        config,
        files,
        json,
    }))
}

fn parse_gen<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut query: Option<PathBuf> = None;
    let mut dry_run = false;
    let mut check = false;

    while let Some(token) = it.next() {
        if take_config(token, &mut it, &mut config)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Gen)),
            "--query" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--query requires a value");
                };
                query = Some(PathBuf::from(v));
            }
            _ if token.starts_with("--query=") => {
                query = Some(PathBuf::from(token.trim_start_matches("--query=")));
            }
            "--dry-run" => dry_run = true,
            "--check" => check = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    let Some(query) = query else {
        anyhow::bail!("gen requires --query <FILE>");
    };
    if dry_run && check {
        anyhow::bail!("--dry-run and --check cannot be combined");
    }

    Ok(Command::Gen(GenArgs {
        config,
        query,
        dry_run,
        check,
    }))
}

fn parse_init<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        if take_config(token, &mut it, &mut config)? {
            continue;
        }
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Init)),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Init(InitArgs { config }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlsketch - schema modeling and SQL generation

USAGE:
  sqlsketch <COMMAND> [OPTIONS]

COMMANDS:
  parse         Parse CREATE TABLE scripts and list the tables found
  gen           Generate SQL from a JSON query file
  init          Write a sqlsketch.toml template

GLOBAL OPTIONS:
  --config <FILE>       Config file path (default: sqlsketch.toml)
  -h, --help            Print help

ENVIRONMENT:
  SQLSKETCH_LOG         Log filter (default: warn)

Run `sqlsketch <command> --help` for more."
            );
        }
        HelpTopic::Parse => {
            println!(
                "\
USAGE:
  sqlsketch parse [OPTIONS] [FILES...]

NOTES:
  Without FILES, the schema.files globs from the config file are parsed.

OPTIONS:
  --config <FILE>       Config file path (default: sqlsketch.toml)
  --json                Print the parsed project as JSON
  -h, --help            Print help"
            );
        }
        HelpTopic::Gen => {
            println!(
                "\
USAGE:
  sqlsketch gen --query <FILE> [OPTIONS]

NOTES:
  The query file holds one query object or an array of them.
  An entry {{\"kind\": \"union\"}} joins the surrounding SELECT queries.

OPTIONS:
  --config <FILE>       Config file path (default: sqlsketch.toml)
  --query <FILE>        JSON query file
  --dry-run             Print the script path if it would change
  --check               Exit non-zero if the script would change
  -h, --help            Print help"
            );
        }
        HelpTopic::Init => {
            println!(
                "\
USAGE:
  sqlsketch init [OPTIONS]

OPTIONS:
  --config <FILE>       Output config path (default: sqlsketch.toml)
  -h, --help            Print help"
            );
        }
    }
}
