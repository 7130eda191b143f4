//! The `slidequiz list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use slidequiz_core::config::load_config_from;
use slidequiz_core::parser::load_unit_directory;

pub fn execute(dir: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => load_config_from(config_path.as_deref())?.lessons_dir,
    };

    let sets = load_unit_directory(&dir)?;
    if sets.is_empty() {
        println!(
            "No unit sets found in {}. Run `slidequiz init` to create an example.",
            dir.display()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Mode", "Units"]);
    for set in &sets {
        table.add_row(vec![
            Cell::new(&set.id),
            Cell::new(&set.name),
            Cell::new(set.mode),
            Cell::new(set.units.len()),
        ]);
    }

    println!("{table}");
    Ok(())
}
