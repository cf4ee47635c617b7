use crate::cli::InitArgs;
use std::path::Path;

const TEMPLATE: &str = r#"
version = "1"

[schema]
# Glob patterns, relative to this file.
files = ["schema/*.sql"]
# Schema used for tables declared without one.
# default_schema = "app"

[output]
format = "sql" # sql | json
# When set, `sqlsketch gen` writes the script here instead of stdout.
# script = "out/script.sql"
"#;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_template(&args.config)
}

fn write_template(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    std::fs::write(path, TEMPLATE.trim_start_matches('\n'))
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;

    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    #[test]
    fn template_is_a_valid_config() {
        let file = ConfigFile::from_toml(TEMPLATE).unwrap();
        assert_eq!(file.schema.files, vec!["schema/*.sql"]);
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = std::env::temp_dir().join(format!("sqlsketch-init-{}", std::process::id()));
        let path = dir.join("sqlsketch.toml");
        let _ = std::fs::remove_dir_all(&dir);

        write_template(&path).unwrap();
        assert!(write_template(&path).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
