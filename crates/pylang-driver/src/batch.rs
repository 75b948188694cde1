//! Directory mode: every `*.json` AST in a directory, spread over a bounded
//! set of worker threads

use crate::{compile_file, write_output, DriverError, Pass};
use pylang_codegen::CodegenOptions;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// How one file of a batch went
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// Written file and the number of diagnostics it carries
    pub result: Result<(PathBuf, usize), DriverError>,
}

impl FileOutcome {
    pub fn is_clean(&self) -> bool {
        matches!(self.result, Ok((_, 0)))
    }
}

/// AST files in `dir`, sorted by name.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>, DriverError> {
    let entries = std::fs::read_dir(dir).map_err(|source| DriverError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DriverError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") && !is_generated(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Snapshots written by an earlier batch run into the same directory.
fn is_generated(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".ast.json") || name.ends_with(".typed.json"))
}

fn output_path(input: &Path, out_dir: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unit".to_string());
    out_dir.join(format!("{}.{}", stem, extension))
}

fn compile_one(
    input: &Path,
    out_dir: &Path,
    stop: Pass,
    options: &CodegenOptions,
) -> Result<(PathBuf, usize), DriverError> {
    let output = compile_file(input, stop, options)?;
    let path = output_path(input, out_dir, output.kind.extension());
    write_output(&path, &output.text)?;
    Ok((path, output.errors.len()))
}

/// Compile every AST file in `dir`, writing results to `out_dir`
/// (default: `dir`). Units are independent and run concurrently.
pub fn compile_dir(
    dir: &Path,
    out_dir: Option<&Path>,
    stop: Pass,
    options: &CodegenOptions,
) -> Result<Vec<FileOutcome>, DriverError> {
    let inputs = collect_inputs(dir)?;
    let out_dir = out_dir.unwrap_or(dir);
    std::fs::create_dir_all(out_dir).map_err(|source| DriverError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;
    tracing::debug!(files = inputs.len(), dir = %dir.display(), "batch compile");

    let workers = worker_count(inputs.len());
    let next = AtomicUsize::new(0);
    let mut indexed: Vec<(usize, FileOutcome)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut done = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(input) = inputs.get(i) else { break };
                        let result = std::panic::catch_unwind(AssertUnwindSafe(|| compile_one(input, out_dir, stop, options)))
                            .unwrap_or_else(|_| Err(DriverError::Panicked(input.clone())));
                        done.push((
                            i,
                            FileOutcome {
                                input: input.clone(),
                                result,
                            },
                        ));
                    }
                    done
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_default())
            .collect()
    });
    indexed.sort_by_key(|(i, _)| *i);
    Ok(indexed.into_iter().map(|(_, outcome)| outcome).collect())
}

/// Threads used for `files` units: never more than the machine offers or
/// than there are files.
pub fn worker_count(files: usize) -> usize {
    let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    cores.min(files).max(1)
}
