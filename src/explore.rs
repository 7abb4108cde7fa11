use anyhow::Result;
use chrono_tz::Tz;
use std::io::{BufRead, Write};

use crate::cloud::{FontScale, Palette, WordCloud};
use crate::models::Polarity;
use crate::render::{render_results_markdown, render_selection};
use crate::selection::ResultsView;

const HELP: &str = "\
Commands:
  pos <term> | pos #<rank>   select a positive term (again to clear)
  neg <term> | neg #<rank>   select a negative term (again to clear)
  expand <id>                expand/collapse a matched analysis
  clear                      drop the current selection
  show                       print the whole page again
  help                       this text
  quit                       leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(Polarity, String),
    SelectRank(Polarity, usize),
    Expand(i64),
    Clear,
    Show,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };
    let cmd = match (head.to_lowercase().as_str(), rest) {
        ("pos" | "neg", "") => Command::Unknown(line.to_string()),
        (p @ ("pos" | "neg"), arg) => {
            let pol = if p == "pos" { Polarity::Positive } else { Polarity::Negative };
            match arg.strip_prefix('#').map(str::parse::<usize>) {
                Some(Ok(rank)) if rank > 0 => Command::SelectRank(pol, rank),
                Some(_) => Command::Unknown(line.to_string()),
                None => Command::Select(pol, arg.to_string()),
            }
        }
        ("expand", arg) => match arg.parse::<i64>() {
            Ok(id) => Command::Expand(id),
            Err(_) => Command::Unknown(line.to_string()),
        },
        ("clear", "") => Command::Clear,
        ("show", "") => Command::Show,
        ("help" | "?", "") => Command::Help,
        ("quit" | "exit" | "q", "") => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(cmd)
}

/// Drive a `ResultsView` from line commands until `quit` or end of input.
pub fn run_explore<R: BufRead, W: Write>(view: &mut ResultsView, tz: &Tz, input: R, mut out: W) -> Result<()> {
    let palette = Palette::default();
    let font = FontScale::default();

    write!(out, "{}", render_results_markdown(view, tz))?;
    writeln!(out, "\nType 'help' for commands.")?;

    for line in input.lines() {
        let line = line?;
        let Some(cmd) = parse_command(&line) else {
            continue;
        };
        match cmd {
            Command::Quit => break,
            Command::Help => write!(out, "{}", HELP)?,
            Command::Show => write!(out, "{}", render_results_markdown(view, tz))?,
            Command::Clear => {
                view.clear_selection();
                write!(out, "{}", render_selection(view, tz))?;
            }
            Command::Select(pol, term) => {
                view.click(&term, pol);
                write!(out, "{}", render_selection(view, tz))?;
            }
            Command::SelectRank(pol, rank) => {
                let cloud = WordCloud::new(view.aggregate().ranked(pol), pol, &palette, &font);
                let mut picked = None;
                if cloud.click(rank - 1, |term, p| picked = Some((term.to_string(), p))) {
                    if let Some((term, p)) = picked {
                        view.click(&term, p);
                    }
                    write!(out, "{}", render_selection(view, tz))?;
                } else {
                    writeln!(out, "No {} term at rank {}.", pol, rank)?;
                }
            }
            Command::Expand(id) => {
                if view.matching().iter().any(|r| r.id == id) {
                    view.toggle_expand(id);
                    write!(out, "{}", render_selection(view, tz))?;
                } else {
                    writeln!(out, "Analysis #{} is not in the current matches.", id)?;
                }
            }
            Command::Unknown(s) => writeln!(out, "Unknown command: {}", s)?,
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateParams;
    use crate::models::Record;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("  "), None);
        assert_eq!(
            parse_command("pos great service"),
            Some(Command::Select(Polarity::Positive, "great service".into()))
        );
        assert_eq!(parse_command("NEG #2"), Some(Command::SelectRank(Polarity::Negative, 2)));
        assert_eq!(parse_command("neg #0"), Some(Command::Unknown("neg #0".into())));
        assert_eq!(parse_command("expand 12"), Some(Command::Expand(12)));
        assert_eq!(parse_command("expand x"), Some(Command::Unknown("expand x".into())));
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("pos"), Some(Command::Unknown("pos".into())));
    }

    #[test]
    fn session_walks_the_state_machine() {
        let records = vec![Record {
            id: 1,
            transcript_id: None,
            summary: Some("Billing question.".into()),
            positive_phrases: vec!["great service".into()],
            negative_phrases: vec!["long wait".into()],
            created_at: None,
        }];
        let mut view = ResultsView::new(records, AggregateParams::default());
        let script = "pos great\nexpand 1\nexpand 7\npos great\nneg #1\nbogus\nquit\npos never reached\n";
        let mut out = Vec::new();
        run_explore(&mut view, &Tz::UTC, script.as_bytes(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("## Analyses containing \"great\" (positive)"));
        assert!(text.contains("- **great** service"));
        assert!(text.contains("Analysis #7 is not in the current matches."));
        assert!(text.contains("Click a word in either cloud"));
        // rank 1 of the negative cloud is the first ranked negative term
        let first_neg = view.aggregate().negative_ranked[0].term.clone();
        assert!(text.contains(&format!("## Analyses containing \"{}\" (negative)", first_neg)));
        assert!(text.contains("Unknown command: bogus"));
        assert!(!text.contains("never reached"));
    }
}
