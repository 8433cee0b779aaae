//! Purpose: Hold top-level CLI command dispatch for `dsbase`.
//! Exports: `DispatchContext`, `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and map each verb onto the catalog API.
//! Invariants: One catalog is opened per invocation; nothing is cached between commands.
//! Invariants: Output envelopes are JSON objects keyed by what the command produced.

use super::*;

pub(super) struct DispatchContext {
    pub(super) client: LocalClient,
    pub(super) base: String,
    pub(super) format: OutputFormat,
}

impl DispatchContext {
    fn open(&self) -> Result<Catalog<FsStore>, Error> {
        self.client.open_base(&self.base)
    }
}

pub(super) fn dispatch_command(
    command: Command,
    ctx: &DispatchContext,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "dsbase", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Bases => {
            let bases = ctx.client.list_bases()?;
            emit_json(json!({ "bases": bases }));
            Ok(RunOutcome::ok())
        }
        Command::Create {
            table,
            families,
            versions,
            disabled,
        } => {
            let mut catalog = ctx.open()?;
            let mut options = CreateOptions::new(versions);
            if disabled {
                options = options.disabled();
            }
            catalog.create_table(&table, families, options)?;
            let desc = catalog.describe_table(&table)?;
            emit_json(json!({ "created": description_json(&desc) }));
            Ok(RunOutcome::ok())
        }
        Command::List => {
            let catalog = ctx.open()?;
            emit_json(json!({ "tables": catalog.list_tables() }));
            Ok(RunOutcome::ok())
        }
        Command::Describe { table, all } => {
            let catalog = ctx.open()?;
            match table {
                Some(table) if !all => {
                    let desc = catalog.describe_table(&table)?;
                    emit_json(json!({ "table": description_json(&desc) }));
                }
                _ => {
                    let tables = catalog
                        .describe_all()
                        .iter()
                        .map(description_json)
                        .collect::<Vec<_>>();
                    emit_json(json!({ "tables": tables }));
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Drop { tables, all } => {
            let mut catalog = ctx.open()?;
            if all {
                let dropped = catalog.drop_all_tables()?;
                emit_json(json!({ "dropped_count": dropped }));
                return Ok(RunOutcome::ok());
            }
            let mut dropped = Vec::new();
            for table in tables {
                catalog.drop_table(&table)?;
                dropped.push(table);
            }
            emit_json(json!({ "dropped": dropped }));
            Ok(RunOutcome::ok())
        }
        Command::Enable { table } => {
            let mut catalog = ctx.open()?;
            catalog.enable_table(&table)?;
            emit_json(json!({ "table": table, "is_enabled": true }));
            Ok(RunOutcome::ok())
        }
        Command::Disable { table } => {
            let mut catalog = ctx.open()?;
            catalog.disable_table(&table)?;
            emit_json(json!({ "table": table, "is_enabled": false }));
            Ok(RunOutcome::ok())
        }
        Command::IsEnabled { table } => {
            let catalog = ctx.open()?;
            let enabled = catalog.is_enabled(&table)?;
            emit_json(json!({ "table": table, "is_enabled": enabled }));
            Ok(RunOutcome::ok())
        }
        Command::Alter { table, op, value } => {
            let mut catalog = ctx.open()?;
            let op = AlterOp::parse(op.as_str(), &value)?;
            catalog.alter_table(&table, op)?;
            let desc = catalog.describe_table(&table)?;
            emit_json(json!({ "altered": description_json(&desc) }));
            Ok(RunOutcome::ok())
        }
        Command::Truncate { table } => {
            let mut catalog = ctx.open()?;
            catalog.truncate(&table)?;
            emit_json(json!({ "truncated": table }));
            Ok(RunOutcome::ok())
        }
        Command::Put {
            table,
            row,
            family,
            qualifier,
            value,
        } => {
            let mut catalog = ctx.open()?;
            let version = catalog.put(&table, &row, &family, &qualifier, &value)?;
            emit_json(json!({
                "table": table,
                "row": row,
                "family": family,
                "qualifier": qualifier,
                "version": version,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Get {
            table,
            row,
            family,
            qualifier,
            version,
        } => {
            let mut catalog = ctx.open()?;
            match (family, qualifier) {
                (Some(family), Some(qualifier)) => {
                    let cell = catalog.get_cell(&table, &row, &family, &qualifier, version)?;
                    emit_json(json!({
                        "table": table,
                        "row": row,
                        "family": family,
                        "qualifier": qualifier,
                        "version": cell.version,
                        "value": cell.value,
                    }));
                }
                _ => {
                    let data = catalog.get(&table, &row)?;
                    match ctx.format {
                        OutputFormat::Cells => emit_text(&render_row(&row, &data)),
                        OutputFormat::Json => {
                            emit_json(json!({ "table": table, "row": row, "families": data }))
                        }
                    }
                }
            }
            Ok(RunOutcome::ok())
        }
        Command::Scan { table, family } => {
            let mut catalog = ctx.open()?;
            let rows = catalog.scan(&table, family.as_deref())?;
            match ctx.format {
                OutputFormat::Cells => emit_text(&render_scan(&rows)),
                OutputFormat::Json => emit_json(json!({
                    "table": table,
                    "row_count": rows.len(),
                    "rows": rows,
                })),
            }
            Ok(RunOutcome::ok())
        }
        Command::Delete {
            table,
            row,
            family,
            qualifier,
            version,
        } => {
            let mut catalog = ctx.open()?;
            catalog.delete(&table, &row, &family, &qualifier, version)?;
            emit_json(json!({
                "deleted": {
                    "table": table,
                    "row": row,
                    "family": family,
                    "qualifier": qualifier,
                    "version": version,
                }
            }));
            Ok(RunOutcome::ok())
        }
        Command::DeleteAll { table, row, family } => {
            let mut catalog = ctx.open()?;
            let touched = catalog.delete_all(&table, &row, family.as_deref())?;
            emit_json(json!({
                "table": table,
                "row": row,
                "families_touched": touched,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Count { table } => {
            let mut catalog = ctx.open()?;
            let count = catalog.count(&table)?;
            emit_json(json!({ "table": table, "count": count }));
            Ok(RunOutcome::ok())
        }
        Command::Status => {
            let catalog = ctx.open()?;
            emit_json(json!({ "status": catalog.status() }));
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            let catalog = ctx.open()?;
            emit_json(json!({
                "version": catalog.version(),
                "cli": env!("CARGO_PKG_VERSION"),
            }));
            Ok(RunOutcome::ok())
        }
        Command::Whoami => {
            let catalog = ctx.open()?;
            emit_json(json!({ "whoami": catalog.whoami() }));
            Ok(RunOutcome::ok())
        }
    }
}
