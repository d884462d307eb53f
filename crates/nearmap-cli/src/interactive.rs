//! Line-oriented session that stands in for the page's buttons, search
//! form and pointer events.

use nearmap_client::{CycleOutcome, InteractionEvent, InteractionTarget, MarkerHandle, RowHandle};
use nearmap_core::Coordinate;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::wiring::App;

const HELP: &str = "\
commands:
  locate                  re-run resolution from the current position
  search <zip|address>    resolve a typed location
  select <lat,lng> [name] resolve a picked place
  hover <target>          start hovering a row or marker
  unhover <target>        stop hovering
  click <target>          open the business website
  map                     print the map
  help                    show this text
  quit                    leave the session
targets: <n> row n, m<n> marker n, l<n> the link inside row n";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Locate,
    Search(String),
    Select {
        coordinate: Coordinate,
        name: Option<String>,
    },
    Interact(InteractionEvent),
    Map,
    Help,
    Quit,
}

fn parse_target(raw: &str) -> Result<InteractionTarget, String> {
    let invalid = || format!("invalid target '{raw}'");
    let (kind, number) = match raw.chars().next() {
        Some('m') => ('m', &raw[1..]),
        Some('l') => ('l', &raw[1..]),
        _ => ('r', raw),
    };
    let n: u64 = number.parse().map_err(|_| invalid())?;
    if kind == 'm' {
        return Ok(InteractionTarget::Marker(MarkerHandle(n)));
    }
    // Rows are shown 1-based.
    let index = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(invalid)?;
    Ok(if kind == 'l' {
        InteractionTarget::RowLink(RowHandle(index))
    } else {
        InteractionTarget::Row(RowHandle(index))
    })
}

pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    let target = |make: fn(InteractionTarget) -> InteractionEvent| {
        if rest.is_empty() {
            return Err(format!("usage: {word} <target>"));
        }
        parse_target(rest).map(|t| Some(Command::Interact(make(t))))
    };

    match word {
        "locate" => Ok(Some(Command::Locate)),
        "search" if rest.is_empty() => Err("usage: search <zip|address>".to_string()),
        "search" => Ok(Some(Command::Search(rest.to_string()))),
        "select" => {
            let (coord, name) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, None), |(c, n)| (c, Some(n.trim().to_string())));
            let coordinate = crate::parse_coordinate(coord)?;
            Ok(Some(Command::Select { coordinate, name }))
        }
        "hover" => target(InteractionEvent::HoverStart),
        "unhover" => target(InteractionEvent::HoverEnd),
        "click" => target(InteractionEvent::Click),
        "map" => Ok(Some(Command::Map)),
        "help" | "?" => Ok(Some(Command::Help)),
        "quit" | "exit" => Ok(Some(Command::Quit)),
        other => Err(format!("unknown command '{other}' (try `help`)")),
    }
}

/// Prints the map after a cycle, or why nothing happened.
fn report(app: &App, outcome: CycleOutcome) {
    tracing::debug!(?outcome, "cycle finished");
    if outcome == CycleOutcome::Unavailable {
        eprintln!("the map did not load; restart once the configuration is fixed");
    } else {
        print!("{}", app.map.render());
    }
}

/// Runs commands from stdin until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub(crate) async fn run_interactive(app: &App) -> anyhow::Result<()> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Map => print!("{}", app.map.render()),
            Command::Locate => report(app, app.orchestrator.locate_me().await),
            Command::Search(query) => {
                if let Some(outcome) = app.orchestrator.search(&query).await {
                    report(app, outcome);
                }
            }
            Command::Select { coordinate, name } => {
                let outcome = app
                    .orchestrator
                    .select_place(coordinate, name.as_deref(), None, &[])
                    .await;
                report(app, outcome);
            }
            Command::Interact(event) => {
                if !app.orchestrator.handle_interaction(event) {
                    eprintln!("nothing to interact with there");
                }
            }
        }
    }

    Ok(())
}
