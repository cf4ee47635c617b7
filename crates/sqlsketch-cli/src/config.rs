use serde::Deserialize;
use sqlsketch::{DdlParser, Project, SkippedStatement};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let file = ConfigFile::from_toml(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to load config file {}: {e:#}",
                config_path.display()
            )
        })?;

        Ok(Self { config_dir, file })
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    pub fn parser(&self) -> DdlParser {
        match &self.file.schema.default_schema {
            Some(schema) => DdlParser::new().with_default_schema(schema.clone()),
            None => DdlParser::new(),
        }
    }

    /// Files matched by `schema.files`, sorted and deduplicated.
    pub fn schema_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        expand_globs(self, &self.file.schema.files)
    }

    /// The output script path, if one is configured.
    pub fn script_path(&self) -> Option<PathBuf> {
        self.file.output.script.as_ref().map(|p| self.resolve_path(p))
    }
}

/// Parse every file into one project. Skipped statements are returned with
/// the file they came from.
pub fn load_project(
    parser: &DdlParser,
    files: &[PathBuf],
) -> anyhow::Result<(Project, Vec<(PathBuf, SkippedStatement)>)> {
    let mut project = Project::new();
    let mut skipped = Vec::new();

    for f in files {
        let content = std::fs::read_to_string(f)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", f.display()))?;
        let file_skipped = project
            .load_sql_with(parser, &content)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", f.display()))?;
        tracing::debug!(file = %f.display(), tables = project.len(), "schema file loaded");
        skipped.extend(file_skipped.into_iter().map(|s| (f.clone(), s)));
    }

    Ok((project, skipped))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    pub schema: SchemaConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    pub files: Vec<String>,
    pub default_schema: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Sql,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub script: Option<String>,
}

impl ConfigFile {
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.expand_env()?;
        file.validate()?;
        Ok(file)
    }

    fn expand_env(&mut self) -> anyhow::Result<()> {
        for f in &mut self.schema.files {
            *f = expand_env_vars(f)?;
        }
        if let Some(schema) = self.schema.default_schema.as_mut() {
            *schema = expand_env_vars(schema)?;
        }
        if let Some(script) = self.output.script.as_mut() {
            *script = expand_env_vars(script)?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }

        if self.schema.files.is_empty() {
            anyhow::bail!("schema.files must not be empty");
        }
        if self.schema.files.iter().any(|f| f.trim().is_empty()) {
            anyhow::bail!("schema.files entries must not be empty");
        }

        if let Some(schema) = &self.schema.default_schema {
            if schema.trim().is_empty() {
                anyhow::bail!("schema.default_schema must not be empty");
            }
        }

        if let Some(script) = &self.output.script {
            if script.trim().is_empty() {
                anyhow::bail!("output.script must not be empty");
            }
        }

        Ok(())
    }
}

fn expand_globs(project: &ProjectConfig, patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: BTreeSet<PathBuf> = BTreeSet::new();

    for p in patterns {
        let abs = project.resolve_path(p);
        let pattern = abs
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("invalid glob pattern: {}", abs.display()))?;

        let mut matched_any = false;
        for entry in
            glob::glob(pattern).map_err(|e| anyhow::anyhow!("invalid glob {pattern}: {e}"))?
        {
            let path = entry.map_err(|e| anyhow::anyhow!("glob error for {pattern}: {e}"))?;
            if path.is_file() {
                matched_any = true;
                files.insert(path);
            }
        }

        if !matched_any {
            anyhow::bail!("glob pattern matched no files: {p}");
        }
    }

    Ok(files.into_iter().collect())
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let file = ConfigFile::from_toml(
            r#"
version = "1"

[schema]
files = ["schema/*.sql"]
"#,
        )
        .unwrap();
        assert_eq!(file.schema.files, vec!["schema/*.sql"]);
        assert_eq!(file.schema.default_schema, None);
        assert_eq!(file.output.format, OutputFormat::Sql);
        assert!(file.output.script.is_none());
    }

    #[test]
    fn full_config() {
        let file = ConfigFile::from_toml(
            r#"
version = "1"

[schema]
files = ["a.sql", "b/*.sql"]
default_schema = "app"

[output]
format = "json"
script = "out/script.sql"
"#,
        )
        .unwrap();
        assert_eq!(file.schema.default_schema.as_deref(), Some("app"));
        assert_eq!(file.output.format, OutputFormat::Json);
        assert_eq!(file.output.script.as_deref(), Some("out/script.sql"));
    }

    #[test]
    fn rejects_bad_version_and_empty_files() {
        let err = ConfigFile::from_toml("version = \"2\"\n[schema]\nfiles = [\"a.sql\"]\n")
            .unwrap_err();
        assert!(err.to_string().contains("unsupported config version"));

        let err = ConfigFile::from_toml("version = \"1\"\n[schema]\nfiles = []\n").unwrap_err();
        assert!(err.to_string().contains("schema.files must not be empty"));

        assert!(ConfigFile::from_toml("version = \"1\"\n").is_err());
    }

    #[test]
    fn rejects_unknown_format() {
        let raw = "version = \"1\"\n[schema]\nfiles = [\"a.sql\"]\n[output]\nformat = \"xml\"\n";
        assert!(ConfigFile::from_toml(raw).is_err());
    }

    #[test]
    fn expands_env_vars() {
        let path = std::env::var("PATH").unwrap();
        assert_eq!(expand_env_vars("x-${PATH}-y").unwrap(), format!("x-{path}-y"));
        assert_eq!(expand_env_vars("no vars").unwrap(), "no vars");
        assert!(expand_env_vars("${UNCLOSED").is_err());
        assert!(expand_env_vars("${}").is_err());
        assert!(expand_env_vars("${SQLSKETCH_SURELY_UNSET_VAR}").is_err());
    }

    #[test]
    fn resolves_relative_paths_against_config_dir() {
        let cfg = ProjectConfig {
            config_dir: PathBuf::from("/proj"),
            file: ConfigFile::from_toml(
                "version = \"1\"\n[schema]\nfiles = [\"a.sql\"]\n[output]\nscript = \"out.sql\"\n",
            )
            .unwrap(),
        };
        assert_eq!(cfg.resolve_path("a.sql"), PathBuf::from("/proj/a.sql"));
        assert_eq!(cfg.resolve_path("/abs.sql"), PathBuf::from("/abs.sql"));
        assert_eq!(cfg.script_path(), Some(PathBuf::from("/proj/out.sql")));
    }
}
