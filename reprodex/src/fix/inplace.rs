//! In-place fixing
//!
//! Runs a named fixer over a file and moves the result over the original.
//! The fixer writes into a staging directory next to the input, so an
//! aborted run leaves the input untouched.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use crate::dex::MapId;
use crate::error::{Error, Result};
use crate::utils::parent_dir;

use super::FixSummary;

/// Command names [`fix_in_place`] can dispatch.
pub const KNOWN_COMMANDS: [&str; 1] = ["fix-pg-map-id"];

/// Runs `command` over `file` in place, passing `args` through to the
/// fixer.
pub fn fix_in_place(command: &str, file: &Path, args: &[String]) -> Result<FixSummary> {
    match command {
        "fix-pg-map-id" => {
            let map_id = match args {
                [id] => id.parse::<MapId>()?,
                _ => {
                    return Err(Error::InvalidFixArgs {
                        command: command.to_string(),
                        message: format!(
                            "expected exactly one PG_MAP_ID argument, got {}",
                            args.len()
                        ),
                    });
                }
            };
            run_in_place(file, |input, output| {
                super::fix_map_id(input, output, &map_id)
            })
        }
        _ => Err(Error::UnknownFixCommand {
            command: command.to_string(),
        }),
    }
}

/// Stages the fixed artifact next to `file`, then swaps it over the input.
fn run_in_place(
    file: &Path,
    run: impl FnOnce(&Path, &Path) -> Result<FixSummary>,
) -> Result<FixSummary> {
    let staging = tempfile::TempDir::with_prefix_in(".inplace-fix-", parent_dir(file))?;
    let file_name = file.file_name().unwrap_or_else(|| OsStr::new("fixed"));
    let staged = staging.path().join(file_name);

    let summary = run(file, &staged)?;

    if file.is_dir() {
        fs::remove_dir_all(file)?;
    }
    fs::rename(&staged, file)?;
    Ok(summary)
}
