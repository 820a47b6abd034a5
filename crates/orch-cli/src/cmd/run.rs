use anyhow::Context;
use orch_core::create_run_pack;
use std::path::Path;

use crate::output::print_json;
use crate::root::{self, Settings};

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Generate (or refresh) the run pack for one ticket and exit.
pub fn run(settings: &Settings, ticket: &Path, json: bool) -> anyhow::Result<()> {
    let ticket = root::ticket_path(ticket)?;
    let pack = create_run_pack(&settings.runs_root, &ticket)
        .with_context(|| format!("failed to create run pack for {}", ticket.display()))?;

    if json {
        return print_json(&pack);
    }

    println!("Created run artifacts: {}", pack.run_dir.display());
    for file in &pack.files_written {
        let name = file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("  {name}");
    }
    Ok(())
}
