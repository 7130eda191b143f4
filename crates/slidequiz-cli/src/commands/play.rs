//! The `slidequiz play` command.
//!
//! A line-oriented front end for a [`Session`]: the engine decides what is
//! allowed, this module only renders state and forwards commands.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use slidequiz_core::config::load_config_from;
use slidequiz_core::model::Mode;
use slidequiz_core::parser;
use slidequiz_core::prepare::PreparedBody;
use slidequiz_core::{ChoiceKey, Session, Step};

const HELP: &str = "\
Commands:
  <n>        choose option n
  <i> <n>    choose candidate n for matching item i
  s          submit the current unit
  a          submit all units at once
  r          reveal all answers
  n          next unit
  p          previous unit
  x          start over
  q          quit";

/// One line of learner input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Choose(usize),
    ChooseItem { item: usize, choice: usize },
    Submit,
    SubmitAll,
    RevealAll,
    Next,
    Previous,
    Reset,
    Help,
    Quit,
}

pub fn execute(
    unit_set_path: PathBuf,
    seed: Option<u64>,
    mode: Option<String>,
    report: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let mut set = parser::parse_unit_set(&unit_set_path)?;
    tracing::debug!("loaded unit set {} from {}", set.id, unit_set_path.display());

    let mode = match mode {
        Some(m) => Some(m.parse::<Mode>().map_err(|e: String| anyhow::anyhow!("{}", e))?),
        None => config.default_mode,
    };
    if let Some(mode) = mode {
        set.mode = mode;
    }

    let mounted = match seed.or(config.seed) {
        Some(seed) => Session::with_rng(&set, &mut StdRng::seed_from_u64(seed)),
        None => Session::new(&set),
    };
    let mut session =
        mounted.with_context(|| format!("cannot run unit set {}", unit_set_path.display()))?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_session(&mut session, stdin.lock(), &mut stdout.lock())?;

    print_summary(&session);

    if let Some(path) = report {
        let path = if path.parent().is_some_and(|p| p.as_os_str().is_empty()) {
            config.report_dir.join(path)
        } else {
            path
        };
        write_report(&session, &path)?;
        tracing::info!("session {} report written to {}", session.id(), path.display());
        println!("Report written to {}", path.display());
    }

    Ok(())
}

/// Drive `session` from `input` until `q` or end of input.
fn run_session<R: BufRead, W: Write>(session: &mut Session, input: R, out: &mut W) -> Result<()> {
    writeln!(out, "{} ({} mode). Type h for help.", session.set_name(), session.mode())?;
    render(session, out)?;

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_action(line) {
            Ok(Action::Quit) => break,
            Ok(Action::Help) => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Ok(action) => apply(session, action, out)?,
            Err(msg) => {
                writeln!(out, "  ! {msg}")?;
                continue;
            }
        }
        render(session, out)?;
    }

    Ok(())
}

fn parse_action(line: &str) -> Result<Action, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["s"] => Ok(Action::Submit),
        ["a"] => Ok(Action::SubmitAll),
        ["r"] => Ok(Action::RevealAll),
        ["n"] => Ok(Action::Next),
        ["p"] => Ok(Action::Previous),
        ["x"] => Ok(Action::Reset),
        ["h"] | ["?"] => Ok(Action::Help),
        ["q"] => Ok(Action::Quit),
        [n] => Ok(Action::Choose(position(n)?)),
        [item, n] => Ok(Action::ChooseItem {
            item: position(item)?,
            choice: position(n)?,
        }),
        _ => Err(format!("unknown command: {line}")),
    }
}

/// Parse a 1-based number into a 0-based position.
fn position(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("choices are numbered from 1".to_string()),
        Ok(n) => Ok(n - 1),
        Err(_) => Err(format!("unknown command: {s}")),
    }
}

fn apply<W: Write>(session: &mut Session, action: Action, out: &mut W) -> Result<()> {
    let unit_id = session.current_unit().id.clone();
    let outcome = match action {
        Action::Choose(_) if session.current_unit().is_matching() => {
            writeln!(out, "  ! this unit needs '<item> <candidate>'")?;
            return Ok(());
        }
        Action::Choose(choice) => session.select(&unit_id, ChoiceKey::Whole, choice),
        Action::ChooseItem { item, choice } => {
            session.select(&unit_id, ChoiceKey::Item(item), choice)
        }
        Action::Submit => Ok(session.submit()),
        Action::SubmitAll => Ok(session.submit_all()),
        Action::RevealAll => Ok(session.reveal_all()),
        Action::Next => Ok(session.advance()),
        Action::Previous => Ok(session.retreat()),
        Action::Reset => {
            session.reset();
            Ok(Step::Applied)
        }
        Action::Help | Action::Quit => Ok(Step::Applied),
    };

    match outcome {
        Ok(Step::Applied) => {}
        Ok(Step::Ignored(violation)) => writeln!(out, "  ({violation})")?,
        Err(e) => writeln!(out, "  ! {e}")?,
    }
    Ok(())
}

fn render<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    if session.is_complete() {
        writeln!(out, "\nComplete! {}", score_line(session))?;
        writeln!(out, "Enter x to start over or q to quit.")?;
        return Ok(());
    }

    let state = session.progression();
    let unit = session.current_unit();
    let revealed = state.revealed;
    let answers: BTreeMap<ChoiceKey, usize> = session.answers_for(&unit.id).into_iter().collect();

    writeln!(out, "\n[{}/{}] {}", state.current_index + 1, state.len, unit.prompt)?;

    match &unit.body {
        PreparedBody::SingleSelect { options, correct } => {
            let picked = answers.get(&ChoiceKey::Whole).copied();
            for (i, option) in options.iter().enumerate() {
                write_choice(out, i, &option.text, picked == Some(i), revealed.then_some(i == *correct))?;
            }
            if revealed {
                if let Some(fb) = picked.and_then(|p| options.get(p)).and_then(|o| o.feedback.as_ref()) {
                    writeln!(out, "  {fb}")?;
                }
            }
        }
        PreparedBody::Matching { items } => {
            for (n, item) in items.iter().enumerate() {
                writeln!(out, "  {}. {}", n + 1, item.label)?;
                let picked = answers.get(&ChoiceKey::Item(n)).copied();
                for (i, candidate) in item.candidates.iter().enumerate() {
                    write!(out, "  ")?;
                    write_choice(out, i, candidate, picked == Some(i), revealed.then_some(i == item.correct))?;
                }
            }
        }
        PreparedBody::Scenario { options } => {
            let picked = answers.get(&ChoiceKey::Whole).copied();
            for (i, option) in options.iter().enumerate() {
                write_choice(out, i, &option.text, picked == Some(i), None)?;
            }
            if revealed {
                if let Some(option) = picked.and_then(|p| options.get(p)) {
                    writeln!(out, "  -> {}: {}", option.outcome, option.feedback)?;
                }
            }
        }
    }

    if revealed && !unit.feedback.is_empty() {
        writeln!(out, "  {}", unit.feedback)?;
    }
    writeln!(out, "{}", score_line(session))?;
    writeln!(out, "> {}", hints(session).join(" | "))?;
    Ok(())
}

fn write_choice<W: Write>(
    out: &mut W,
    index: usize,
    text: &str,
    picked: bool,
    correct: Option<bool>,
) -> Result<()> {
    let marker = if picked { "*" } else { " " };
    let verdict = match (correct, picked) {
        (Some(true), _) => "  [correct]",
        (Some(false), true) => "  [incorrect]",
        _ => "",
    };
    writeln!(out, "  {marker} {}) {}{verdict}", index + 1, text)?;
    Ok(())
}

fn score_line(session: &Session) -> String {
    let score = session.score();
    let counters: Vec<String> = score
        .counters
        .iter()
        .map(|(name, count)| format!("{name} {count}"))
        .collect();
    let mut parts = Vec::new();
    if !counters.is_empty() {
        parts.push(counters.join(", "));
    }
    parts.push(format!("total {}", score.total));
    parts.push(format!("progress {}%", session.progress_percent()));
    format!("Score: {}", parts.join(" | "))
}

fn hints(session: &Session) -> Vec<&'static str> {
    let mut hints = Vec::new();
    if session.can_submit() {
        hints.push("s submit");
    }
    if session.can_submit_all() {
        hints.push("a submit all");
    }
    if session.can_reveal_all() {
        hints.push("r reveal all");
    }
    if session.can_advance() {
        let state = session.progression();
        hints.push(if state.current_index + 1 == state.len {
            "n finish"
        } else {
            "n next"
        });
    }
    if session.can_retreat() {
        hints.push("p previous");
    }
    hints.extend(["x reset", "q quit"]);
    hints
}

fn print_summary(session: &Session) {
    use comfy_table::{Cell, Table};

    let score = session.score();
    let mut table = Table::new();
    table.set_header(vec!["Counter", "Count", "Percent"]);
    for (name, count) in &score.counters {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(count),
            Cell::new(format!("{}%", score.percent(name))),
        ]);
    }
    table.add_row(vec![Cell::new("total"), Cell::new(score.total), Cell::new("")]);

    let status = if session.is_complete() {
        "complete"
    } else {
        "incomplete"
    };
    println!("\n{} ({status})\n{table}", session.set_name());
}

fn write_report(session: &Session, path: &Path) -> Result<()> {
    let report = session.report();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    if path.extension().is_some_and(|ext| ext == "md") {
        std::fs::write(path, report.to_markdown())
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    } else {
        report.save_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUIZ: &str = r#"
[unit_set]
id = "quiz"
name = "Quiz"
mode = "checkpoint"

[[units]]
id = "innate"
kind = "single_select"
prompt = "What does innate mean?"
feedback = "Present from birth."
correct = 1
options = ["Learned", "Present from birth", "Developed later"]

[[units]]
id = "sense"
kind = "single_select"
prompt = "Which sense is most developed at birth?"
correct = 2
options = ["Vision", "Hearing", "Smell"]

[[units]]
id = "studies"
kind = "matching"
prompt = "Match the studies"

[[units.items]]
label = "Meltzoff & Moore"
candidates = ["Imitation", "Synchrony"]
correct = 0
"#;

    fn session() -> Session {
        let set = parser::parse_unit_set_str(QUIZ, Path::new("quiz.toml")).unwrap();
        Session::with_rng(&set, &mut StdRng::seed_from_u64(1)).unwrap()
    }

    fn play(session: &mut Session, input: &str) -> String {
        let mut out = Vec::new();
        run_session(session, Cursor::new(input), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_actions() {
        assert_eq!(parse_action("s"), Ok(Action::Submit));
        assert_eq!(parse_action("n"), Ok(Action::Next));
        assert_eq!(parse_action("3"), Ok(Action::Choose(2)));
        assert_eq!(
            parse_action("1 2"),
            Ok(Action::ChooseItem { item: 0, choice: 1 })
        );
        assert!(parse_action("0").is_err());
        assert!(parse_action("jump").is_err());
        assert!(parse_action("1 2 3").is_err());
    }

    #[test]
    fn plays_through_a_quiz() {
        let mut s = session();
        let out = play(&mut s, "2\ns\nn\n1\ns\nn\n1 1\ns\nn\nq\n");

        assert!(out.contains("[1/3] What does innate mean?"));
        assert!(out.contains("* 2) Present from birth  [correct]"));
        assert!(out.contains("* 1) Vision  [incorrect]"));
        assert!(out.contains("Complete! Score: correct 2 | total 3 | progress 100%"));
        assert!(s.is_complete());
    }

    #[test]
    fn reports_ignored_and_invalid_commands() {
        let mut s = session();
        let out = play(&mut s, "n\n9\njump\n1 1\nq\n");

        assert!(out.contains("(feedback for the current unit has not been revealed)"));
        assert!(out.contains("! choice 8 is out of range for unit 'innate' (3 choices)"));
        assert!(out.contains("! unknown command: jump"));
        assert!(out.contains("! invalid choice key item 0 for unit 'innate'"));
        assert_eq!(s.progression().current_index, 0);
    }

    #[test]
    fn matching_unit_needs_item_and_candidate() {
        let mut s = session();
        s.select("innate", ChoiceKey::Whole, 1).unwrap();
        s.select("sense", ChoiceKey::Whole, 2).unwrap();
        s.select("studies", ChoiceKey::Item(0), 0).unwrap();
        s.submit();
        s.advance();
        s.submit();
        s.advance();

        let out = play(&mut s, "1\nq\n");
        assert!(out.contains("! this unit needs '<item> <candidate>'"));
    }

    #[test]
    fn reveal_all_then_reset() {
        let mut s = session();
        let out = play(&mut s, "r\nx\nq\n");
        assert!(out.contains("2) Present from birth  [correct]"));
        assert!(!s.is_revealed("innate"));
        assert!(s.answers().is_empty());
    }
}
