//! The `slidequiz init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("slidequiz.toml").exists() {
        println!("slidequiz.toml already exists, skipping.");
    } else {
        std::fs::write("slidequiz.toml", SAMPLE_CONFIG)?;
        println!("Created slidequiz.toml");
    }

    std::fs::create_dir_all("lessons")?;
    let example_path = Path::new("lessons/example.toml");
    if example_path.exists() {
        println!("lessons/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_UNIT_SET)?;
        println!("Created lessons/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit lessons/example.toml or add your own unit sets");
    println!("  2. Run: slidequiz validate --unit-set lessons");
    println!("  3. Run: slidequiz play --unit-set lessons/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# slidequiz configuration

lessons_dir = "./lessons"
report_dir = "./slidequiz-reports"

# Run every unit set in this mode instead of its own: review, simulation, checkpoint
# default_mode = "review"

# Fixed shuffle seed (also settable with SLIDEQUIZ_SEED)
# seed = 42
"#;

const EXAMPLE_UNIT_SET: &str = r#"[unit_set]
id = "example"
name = "Example Unit Set"
description = "One of each unit kind"
mode = "review"

[scoring]
categories = { calm = "calm", rushed = "rushed" }

[[units]]
id = "capital"
kind = "single_select"
prompt = "What is the capital of France?"
feedback = "Paris has been the capital since the 10th century."
correct = 0
options = ["Paris", "Lyon", "Marseille"]

[[units]]
id = "rivers"
kind = "matching"
prompt = "Match each city to its river."
feedback = "Each of these cities grew up along its river."

[[units.items]]
label = "London"
candidates = ["Thames", "Seine", "Danube"]
correct = 0

[[units.items]]
label = "Paris"
candidates = ["Thames", "Seine", "Danube"]
correct = 1

[[units]]
id = "deadline"
kind = "scenario"
prompt = "A deadline moves up by a week. What do you do?"
feedback = "Either can work; notice which one you reach for first."

[[units.options]]
text = "Re-plan the remaining work with the team"
outcome = "calm"
feedback = "The team agrees on what to drop."

[[units.options]]
text = "Work late every night"
outcome = "rushed"
feedback = "It gets done, but quality slips."
"#;
