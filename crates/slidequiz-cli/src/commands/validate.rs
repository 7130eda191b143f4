//! The `slidequiz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use slidequiz_core::parser;
use slidequiz_core::prepare::check_unit_set;

pub fn execute(unit_set_path: PathBuf) -> Result<()> {
    let from_dir = unit_set_path.is_dir();
    let paths = if from_dir {
        parser::unit_set_paths(&unit_set_path)?
    } else {
        vec![unit_set_path]
    };

    let mut total_warnings = 0;
    let mut invalid = 0;

    for path in &paths {
        let set = match parser::parse_unit_set(path) {
            Ok(set) => set,
            Err(e) if !from_dir => return Err(e),
            Err(e) => {
                println!("{}", path.display());
                println!("   ERROR: {e:#}");
                invalid += 1;
                continue;
            }
        };
        tracing::debug!("checking {} from {}", set.id, path.display());
        println!("Unit set: {} ({} units)", set.name, set.units.len());

        if let Err(e) = check_unit_set(&set) {
            println!("   ERROR: {e}");
            invalid += 1;
        }

        let warnings = parser::validate_unit_set(&set);
        for w in &warnings {
            let prefix = w
                .unit_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if invalid > 0 {
        anyhow::bail!("{invalid} unit set(s) failed validation");
    }

    if total_warnings == 0 {
        println!("All unit sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
