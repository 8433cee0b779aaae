//! Purpose: `dsbase` CLI entry point and argument model.
//! Role: Binary crate root; parses args, runs one catalog command, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (JSON, or cell lines with `--format cells`).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All table mutations go through `api::Catalog` (guards + explicit persists).
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod cell_render;
mod command_dispatch;

use cell_render::{render_row, render_scan};
use dsbase::api::{
    AlterOp, Catalog, CreateOptions, Error, ErrorKind, FsStore, LocalClient, TableDescription,
    default_base_dir, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `dsbase --help` for usage."));
            }
        },
    };

    init_tracing();

    let base_dir = cli.dir.unwrap_or_else(default_base_dir);
    let ctx = command_dispatch::DispatchContext {
        client: LocalClient::new().with_base_dir(base_dir),
        base: cli.base,
        format: cli.format,
    };

    command_dispatch::dispatch_command(cli.command, &ctx)
        .map_err(add_disabled_hint)
        .map_err(add_storage_hint)
        .map_err(add_internal_hint)
}

fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let replacement = arg.to_str().and_then(|value| match value {
                "---help" => Some("--help"),
                "---version" => Some("--version"),
                _ => None,
            });
            replacement.map(OsString::from).unwrap_or(arg)
        })
        .collect()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "dsbase",
    version,
    about = "Sparse, versioned, column-family tables in plain JSON files",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Data model: table -> column family -> row -> qualifier -> versions.

Mental model:
  - DDL (`create`, `alter`, `drop`, ...) edits the catalog metadata
  - DML (`put`, `get`, `scan`, ...) needs the table to be enabled
  - each cell keeps at most the table's `--versions` newest values
"#,
    after_help = r#"EXAMPLES
  $ dsbase create people info contact --versions 2
  $ dsbase put people r1 info name Alice
  $ dsbase put people r1 info name Alicia
  $ dsbase get people r1
  $ dsbase scan people --format cells

LEARN MORE
  $ dsbase <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Directory holding bases (default: ~/.dsbase/bases)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Base (catalog instance) to operate on"
    )]
    base: String,
    #[arg(
        long,
        global = true,
        default_value = "json",
        value_enum,
        help = "Output format for row results: json|cells"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Cells,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AlterOpCli {
    Add,
    Delete,
    Rename,
}

impl AlterOpCli {
    fn as_str(self) -> &'static str {
        match self {
            AlterOpCli::Add => "add",
            AlterOpCli::Delete => "delete",
            AlterOpCli::Rename => "rename",
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Create a table with one or more column families",
        after_help = r#"EXAMPLES
  $ dsbase create people info
  $ dsbase create people info contact --versions 3
  $ dsbase create archive raw --disabled"#
    )]
    Create {
        #[arg(help = "Table name")]
        table: String,
        #[arg(required = true, help = "Column family names")]
        families: Vec<String>,
        #[arg(long, default_value_t = 1, help = "Versions kept per cell")]
        versions: u32,
        #[arg(long, help = "Create the table disabled")]
        disabled: bool,
    },
    #[command(about = "List tables in the base")]
    List,
    #[command(about = "List initialized bases in the base directory")]
    Bases,
    #[command(
        about = "Show a table's schema and state",
        after_help = r#"EXAMPLES
  $ dsbase describe people
  $ dsbase describe --all"#
    )]
    Describe {
        #[arg(help = "Table name", required_unless_present = "all")]
        table: Option<String>,
        #[arg(long, conflicts_with = "table", help = "Describe every table")]
        all: bool,
    },
    #[command(
        about = "Drop tables and all of their data",
        after_help = r#"EXAMPLES
  $ dsbase drop people
  $ dsbase drop people courses
  $ dsbase drop --all"#
    )]
    Drop {
        #[arg(help = "Table names", required_unless_present = "all")]
        tables: Vec<String>,
        #[arg(long, conflicts_with = "tables", help = "Drop every table")]
        all: bool,
    },
    #[command(arg_required_else_help = true, about = "Enable a table for reads and writes")]
    Enable {
        table: String,
    },
    #[command(arg_required_else_help = true, about = "Disable a table (DML is rejected)")]
    Disable {
        table: String,
    },
    #[command(arg_required_else_help = true, about = "Report whether a table is enabled")]
    IsEnabled {
        table: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "Add, delete, or rename a column family",
        after_help = r#"EXAMPLES
  $ dsbase alter people add contact
  $ dsbase alter people rename contact:reach
  $ dsbase alter people delete reach

NOTES
  - `delete` destroys the family's data; it cannot be undone"#
    )]
    Alter {
        table: String,
        #[arg(value_enum)]
        op: AlterOpCli,
        #[arg(help = "Family name, or OLD:NEW for rename")]
        value: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "Remove all rows, keeping the schema"
    )]
    Truncate {
        table: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "Write a new version of a cell",
        after_help = r#"EXAMPLES
  $ dsbase put people r1 info name Alice"#
    )]
    Put {
        table: String,
        row: String,
        family: String,
        qualifier: String,
        value: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "Read a whole row, or one cell",
        after_help = r#"EXAMPLES
  $ dsbase get people r1                       # every family, every version
  $ dsbase get people r1 info name             # latest version
  $ dsbase get people r1 info name --version 2"#
    )]
    Get {
        table: String,
        row: String,
        #[arg(requires = "qualifier")]
        family: Option<String>,
        qualifier: Option<String>,
        #[arg(long, requires = "qualifier", help = "Exact version to read")]
        version: Option<u64>,
    },
    #[command(arg_required_else_help = true, about = "Dump every row of a table")]
    Scan {
        table: String,
        #[arg(long, help = "Only read this column family")]
        family: Option<String>,
    },
    #[command(arg_required_else_help = true, about = "Delete one version of a cell")]
    Delete {
        table: String,
        row: String,
        family: String,
        qualifier: String,
        version: u64,
    },
    #[command(arg_required_else_help = true, about = "Delete a row from one or all families")]
    DeleteAll {
        table: String,
        row: String,
        #[arg(long, help = "Only delete from this column family")]
        family: Option<String>,
    },
    #[command(arg_required_else_help = true, about = "Count distinct rows")]
    Count {
        table: String,
    },
    #[command(about = "Print the base's status block")]
    Status,
    #[command(about = "Print the catalog version")]
    Version,
    #[command(about = "Print the operator identity")]
    Whoami,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ dsbase completion bash > ~/.local/share/bash-completion/completions/dsbase
  $ dsbase completion zsh > ~/.zfunc/_dsbase"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn add_disabled_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Disabled || err.hint().is_some() {
        return err;
    }
    err.with_hint("Enable the table with `dsbase enable <table>`.")
}

fn add_storage_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Storage => {
            err.with_hint("Storage error. Check the base directory, permissions, and disk space.")
        }
        ErrorKind::Corrupt => err.with_hint(
            "A document could not be decoded. Inspect or restore the JSON files under --dir.",
        ),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

fn emit_json(value: Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_text(text: &str) {
    print!("{text}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::DuplicateFamily => "duplicate column family".to_string(),
        ErrorKind::UnknownFamily => "unknown column family".to_string(),
        ErrorKind::RowNotFound => "row not found".to_string(),
        ErrorKind::QualifierNotFound => "qualifier not found".to_string(),
        ErrorKind::VersionNotFound => "version not found".to_string(),
        ErrorKind::Disabled => "table is disabled".to_string(),
        ErrorKind::InvalidFormat => "invalid format".to_string(),
        ErrorKind::NoOp => "nothing to do".to_string(),
        ErrorKind::Storage => "storage error".to_string(),
        ErrorKind::Corrupt => "corrupt document".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(table) = err.table() {
        lines.push(format!("  table: {table}"));
    }
    if let Some(row) = err.row() {
        lines.push(format!("  row: {row}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("  path: {}", path.display()));
    }
    for cause in error_causes(err) {
        lines.push(format!("  caused by: {cause}"));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    lines.join("\n")
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(table) = err.table() {
        inner.insert("table".to_string(), json!(table));
    }
    if let Some(row) = err.row() {
        inner.insert("row".to_string(), json!(row));
    }
    if let Some(version) = err.version() {
        inner.insert("version".to_string(), json!(version));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn description_json(desc: &TableDescription) -> Value {
    json!({
        "table": desc.name,
        "column_families": desc.column_families,
        "max_versions": desc.max_versions,
        "is_enabled": desc.is_enabled,
    })
}
