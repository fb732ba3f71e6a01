//! Fixture file helpers.

use std::path::{Path, PathBuf};

/// Writes `lines` to `dir/name`, one per line, and returns the full path.
pub fn write_lines<S: AsRef<str>>(
    dir: &Path,
    name: &str,
    lines: impl IntoIterator<Item = S>,
) -> anyhow::Result<PathBuf> {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, text)?;
    Ok(path)
}

/// Reads a text file into its lines, without line terminators.
pub fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {}: {e}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Lists the file names in `dir`, sorted.
pub fn file_names(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        names.push(
            name.into_string()
                .map_err(|name| anyhow::anyhow!("non-utf8 file name {name:?}"))?,
        );
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_write_and_read_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = super::write_lines(dir.path(), "1.txt", ["a", "b"]).unwrap();
        assert_eq!(super::read_lines(&path).unwrap(), ["a", "b"]);
        assert_eq!(super::file_names(dir.path()).unwrap(), ["1.txt"]);
    }
}
