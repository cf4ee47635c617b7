use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub dry_run: bool,
    pub check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Unchanged,
    WouldWrite,
    Written,
}

/// Write `content` to `path` if it differs from what is there.
///
/// `dry_run` only reports, `check` fails when the file is out of date.
pub fn write_if_changed(
    path: &Path,
    content: &str,
    opts: WriteOptions,
) -> anyhow::Result<WriteOutcome> {
    let existing = std::fs::read_to_string(path).ok();
    if existing.as_deref() == Some(content) {
        return Ok(WriteOutcome::Unchanged);
    }

    if opts.dry_run {
        println!("would write {}", path.display());
        return Ok(WriteOutcome::WouldWrite);
    }

    if opts.check {
        anyhow::bail!("generated script is out of date: {}", path.display());
    }

    write_atomic(path, content)?;
    println!("wrote {}", path.display());
    Ok(WriteOutcome::Written)
}

fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    let tmp = tmp_path(path);
    std::fs::write(&tmp, content)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", tmp.display()))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        anyhow::anyhow!(
            "failed to rename {} -> {}: {e}",
            tmp.display(),
            path.display()
        )
    })?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sqlsketch-write-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn tmp_path_keeps_extension() {
        assert_eq!(tmp_path(Path::new("out/a.sql")), PathBuf::from("out/a.sql.tmp"));
        assert_eq!(tmp_path(Path::new("out/script")), PathBuf::from("out/script.tmp"));
    }

    #[test]
    fn writes_then_reports_unchanged() {
        let dir = scratch("write");
        let path = dir.join("nested/script.sql");

        let outcome = write_if_changed(&path, "DROP TABLE `s`.`t`;", WriteOptions::default());
        assert_eq!(outcome.unwrap(), WriteOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "DROP TABLE `s`.`t`;");

        let check = WriteOptions {
            dry_run: false,
            check: true,
        };
        assert_eq!(
            write_if_changed(&path, "DROP TABLE `s`.`t`;", check).unwrap(),
            WriteOutcome::Unchanged
        );
        assert!(write_if_changed(&path, "something else", check).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn dry_run_leaves_file_alone() {
        let dir = scratch("dry");
        let path = dir.join("script.sql");
        let opts = WriteOptions {
            dry_run: true,
            check: false,
        };
        assert_eq!(
            write_if_changed(&path, "x", opts).unwrap(),
            WriteOutcome::WouldWrite
        );
        assert!(!path.exists());
    }
}
