use std::path::Path;

use super::RunOptions;

pub fn run(opts: &RunOptions, output: Option<&Path>) -> Result<(), String> {
    let pop = super::simulate(opts, false)?;
    let content = serde_json::to_string_pretty(&pop.snapshot())
        .map_err(|e| format!("JSON serialization error: {e}"))?;

    if let Some(path) = output {
        std::fs::write(path, &content)
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        println!("  Snapshot of tick {} written to {}", pop.current_tick(), path.display());
    } else {
        println!("{content}");
    }

    Ok(())
}
