use crate::cli::ParseArgs;
use crate::config::{OutputFormat, ProjectConfig, load_project};
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use sqlsketch::Project;

pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    // Explicit files make the config optional.
    let config = if args.files.is_empty() || args.config.exists() {
        Some(ProjectConfig::load(&args.config)?)
    } else {
        None
    };

    let files = if args.files.is_empty() {
        match &config {
            Some(cfg) => cfg.schema_files()?,
            None => anyhow::bail!("no files given and no config found"),
        }
    } else {
        args.files.clone()
    };

    let parser = config.as_ref().map(|c| c.parser()).unwrap_or_default();
    let (project, skipped) = load_project(&parser, &files)?;

    for (file, s) in &skipped {
        eprintln!(
            "{} {}: statement {}: {} ({})",
            "skipped".yellow().bold(),
            file.display(),
            s.index + 1,
            s.reason,
            s.preview
        );
    }

    let json = args.json
        || config
            .as_ref()
            .is_some_and(|c| c.file.output.format == OutputFormat::Json);
    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
        return Ok(());
    }

    println!("{}", tables_overview(&project));
    println!(
        "{} {} table(s) from {} file(s), {} statement(s) skipped",
        "✓".green().bold(),
        project.len(),
        files.len(),
        skipped.len()
    );
    Ok(())
}

fn header(title: &str) -> Cell {
    Cell::new(title).add_attribute(Attribute::Bold).fg(Color::Cyan)
}

fn tables_overview(project: &Project) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header("Table"),
            header("Fields"),
            header("Primary key"),
            header("References"),
            header("Indexes"),
        ]);

    for t in project.tables() {
        let fields: Vec<String> = t.fields.iter().map(|f| format!("{} {}", f.name, f.ty)).collect();
        let references: Vec<String> = t
            .fields
            .iter()
            .filter_map(|f| {
                f.foreign_reference()
                    .map(|r| format!("{} → {}.{}.{}", f.name, r.schema, r.table, r.column))
            })
            .collect();
        let index: Vec<String> = t
            .index
            .iter()
            .map(|i| format!("{} {}", i.kind.as_str(), i.name))
            .collect();

        table.add_row(vec![
            Cell::new(t.table_ref()).add_attribute(Attribute::Bold),
            Cell::new(fields.join("\n")),
            Cell::new(t.primary_key().join(", ")).fg(Color::Green),
            Cell::new(references.join("\n")),
            Cell::new(index.join("\n")),
        ]);
    }
    table
}
