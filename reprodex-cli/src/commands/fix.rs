use std::path::Path;
use std::time::Instant;

use console::style;
use reprodex::dex::MapId;
use reprodex::fix::FixSummary;

use crate::progress::{DISK, PACKAGE, print_done, print_step};

pub fn execute(input: &Path, output: &Path, pg_map_id: &str, quiet: bool) -> anyhow::Result<()> {
    let map_id: MapId = pg_map_id.parse()?;
    let started = Instant::now();

    if !quiet {
        print_step(
            1,
            2,
            PACKAGE,
            &format!("Fixing pg-map-id in {} -> {map_id}", input.display()),
        );
    }
    let summary = reprodex::fix::fix_map_id(input, output, &map_id)?;
    if !quiet {
        print_step(2, 2, DISK, &format!("Wrote {}", output.display()));
        print_summary(&summary);
        print_done(started.elapsed());
    }

    Ok(())
}

/// Per-file outcome lines shared with the in-place form.
pub fn print_summary(summary: &FixSummary) {
    for name in &summary.rewritten {
        println!("  {} {name}", style("rewritten").green());
    }
    for name in &summary.unchanged {
        println!("  {} {name}", style("unchanged").dim());
    }
}
