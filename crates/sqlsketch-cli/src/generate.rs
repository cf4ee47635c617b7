use crate::cli::GenArgs;
use crate::config::{OutputFormat, ProjectConfig, load_project};
use crate::write::{WriteOptions, write_if_changed};
use colored::Colorize;
use serde::Deserialize;
use sqlsketch::{
    Project, Query, Script, StatementKind, generate, is_table_altered, validate_options,
};

/// `{"kind": "union"}`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Marker {
    Union,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Entry {
    Marker(Marker),
    Query(Box<Query>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum QueryFile {
    Many(Vec<Entry>),
    One(Entry),
}

impl QueryFile {
    fn into_entries(self) -> Vec<Entry> {
        match self {
            Self::Many(entries) => entries,
            Self::One(entry) => vec![entry],
        }
    }
}

pub fn run(args: GenArgs) -> anyhow::Result<()> {
    let config = ProjectConfig::load(&args.config)?;
    let files = config.schema_files()?;
    let (mut project, skipped) = load_project(&config.parser(), &files)?;
    if !skipped.is_empty() {
        tracing::info!(count = skipped.len(), "statements skipped while loading schema");
    }

    let raw = std::fs::read_to_string(&args.query)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", args.query.display()))?;
    let entries = parse_entries(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", args.query.display()))?;

    let script = build_script(&mut project, entries)?;

    let rendered = match config.file.output.format {
        OutputFormat::Sql => script.to_sql(),
        OutputFormat::Json => serde_json::to_string_pretty(script.lines())?,
    };

    match config.script_path() {
        Some(path) => {
            write_if_changed(
                &path,
                &rendered,
                WriteOptions {
                    dry_run: args.dry_run,
                    check: args.check,
                },
            )?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn parse_entries(raw: &str) -> anyhow::Result<Vec<Entry>> {
    let file: QueryFile = serde_json::from_str(raw)?;
    Ok(file.into_entries())
}

/// Validate, generate and collect every entry in order. DDL queries are
/// applied to `project` so later entries see their effect.
fn build_script(project: &mut Project, entries: Vec<Entry>) -> anyhow::Result<Script> {
    let mut script = Script::new();

    for (i, entry) in entries.into_iter().enumerate() {
        let n = i + 1;
        let query = match entry {
            Entry::Marker(Marker::Union) => {
                if !script.union() {
                    anyhow::bail!("entry {n}: UNION must follow a SELECT");
                }
                continue;
            }
            Entry::Query(query) => *query,
        };

        validate_options(&query, project)
            .into_result()
            .map_err(|e| anyhow::anyhow!("entry {n} ({}): {e}", query.kind()))?;

        if let Query::Alter(opts) = &query {
            let unchanged = project
                .table(&opts.table)
                .is_some_and(|live| !is_table_altered(live, opts));
            if unchanged {
                eprintln!(
                    "{} entry {n}: table {} is unchanged",
                    "ℹ".blue(),
                    opts.table
                );
                continue;
            }
        }

        if script.has_dangling_union() && query.kind() != StatementKind::Select {
            eprintln!(
                "{} entry {n}: UNION dropped before {}",
                "⚠".yellow().bold(),
                query.kind()
            );
        }

        let sql = generate(project, &query)
            .map_err(|e| anyhow::anyhow!("entry {n} ({}): {e}", query.kind()))?;
        script.push(query.kind(), sql);

        project
            .apply(&query)
            .map_err(|e| anyhow::anyhow!("entry {n} ({}): {e}", query.kind()))?;
    }

    if script.has_dangling_union() {
        anyhow::bail!("UNION at the end of the query file has nothing to join");
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = "
        CREATE TABLE `shop`.`customers` (`id` INT NOT NULL, `name` VARCHAR(50), PRIMARY KEY (`id`));
        CREATE TABLE `shop`.`orders` (
          `id` INT NOT NULL,
          `customer_id` INT,
          PRIMARY KEY (`id`),
          CONSTRAINT `fk_orders_customers` FOREIGN KEY (`customer_id`)
            REFERENCES `shop`.`customers` (`id`));";

    fn shop() -> Project {
        let mut project = Project::new();
        project.load_sql(SHOP).unwrap();
        project
    }

    fn build(raw: &str) -> anyhow::Result<(Project, Script)> {
        let mut project = shop();
        let script = build_script(&mut project, parse_entries(raw)?)?;
        Ok((project, script))
    }

    #[test]
    fn single_query_object() {
        let (_, script) = build(
            r#"{"kind": "delete", "table": {"schema": "shop", "title": "orders"}, "where": "id = 1"}"#,
        )
        .unwrap();
        assert_eq!(script.to_sql(), "DELETE FROM `shop`.`orders` WHERE id = 1;");
    }

    #[test]
    fn union_joins_selects() {
        let (_, script) = build(
            r#"[
              {"kind": "select", "fields": [{"table": {"schema": "shop", "title": "customers"}, "column": "name"}]},
              {"kind": "union"},
              {"kind": "select", "fields": [{"table": {"schema": "shop", "title": "customers"}, "column": "id"}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            script.lines(),
            [
                "SELECT `shop`.`customers`.`name` FROM `shop`.`customers`",
                "UNION",
                "SELECT `shop`.`customers`.`id` FROM `shop`.`customers`;",
            ]
        );
    }

    #[test]
    fn drop_is_applied_to_the_project() {
        let (project, script) = build(
            r#"[
              {"kind": "drop", "table": {"schema": "shop", "title": "customers"}},
              {"kind": "select", "fields": [{"table": {"schema": "shop", "title": "orders"}, "column": "id"}]}
            ]"#,
        )
        .unwrap();
        assert_eq!(project.len(), 1);
        assert_eq!(
            script.lines()[0],
            "ALTER TABLE `shop`.`orders` DROP CONSTRAINT `fk_orders_customers`;\nDROP TABLE `shop`.`customers`;"
        );
    }

    #[test]
    fn validation_errors_name_the_entry() {
        let err = build(
            r#"[
              {"kind": "delete", "table": {"schema": "shop", "title": "orders"}, "where": "id = 1"},
              {"kind": "update", "table": {"schema": "shop", "title": "orders"}, "values": [{"name": "id", "value": "2"}]}
            ]"#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("entry 2 (update)"), "{msg}");
        assert!(msg.contains("Where Clause must be filled."), "{msg}");
    }

    #[test]
    fn union_needs_a_select_on_both_sides() {
        assert!(build(r#"[{"kind": "union"}]"#).is_err());
        assert!(
            build(
                r#"[
                  {"kind": "select", "fields": [{"table": {"schema": "shop", "title": "orders"}, "column": "id"}]},
                  {"kind": "union"}
                ]"#
            )
            .is_err()
        );
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(parse_entries(r#"{"kind": "truncate"}"#).is_err());
    }
}
