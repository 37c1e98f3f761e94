//! Reading and writing unit files, JSON output helpers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use instrument_types::env_utils::env_bool;
use instrument_types::ClassUnit;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn read_unit(path: &Path) -> Result<ClassUnit> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read unit file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse unit file {}", path.display()))
}

/// Write `unit` to `path`, creating parent directories.
///
/// Output is compact unless `CLASSPATH_INSTRUMENT_PRETTY` is set.
pub fn write_unit(path: &Path, unit: &ClassUnit) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    let content = if env_bool("CLASSPATH_INSTRUMENT_PRETTY") {
        serde_json::to_string_pretty(unit)?
    } else {
        serde_json::to_string(unit)?
    };
    fs::write(path, content).with_context(|| format!("write unit file {}", path.display()))
}

/// Unit files named by `inputs`: files as given, directories searched
/// recursively for `*.json`. Each file is paired with its path relative to
/// the input it was found under.
///
/// Fails if two files would be written to the same relative output path.
pub fn collect_unit_files(inputs: &[PathBuf]) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut files: Vec<(PathBuf, PathBuf)> = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            walk_json_files(input, &mut found)?;
            found.sort();
            for file in found {
                let relative = file.strip_prefix(input).unwrap_or(&file).to_path_buf();
                files.push((file, relative));
            }
        } else {
            let relative = input
                .file_name()
                .map(PathBuf::from)
                .with_context(|| format!("input {} has no file name", input.display()))?;
            files.push((input.clone(), relative));
        }
    }

    let mut seen: BTreeMap<&Path, &Path> = BTreeMap::new();
    for (file, relative) in &files {
        if let Some(first) = seen.insert(relative.as_path(), file.as_path()) {
            bail!(
                "{} and {} both map to output {}",
                first.display(),
                file.display(),
                relative.display()
            );
        }
    }
    Ok(files)
}

fn walk_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            walk_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}
