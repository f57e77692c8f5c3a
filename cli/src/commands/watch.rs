//! Interactive view: keeps the pending list on screen and resolves entries
//! from commands typed on stdin.

use std::collections::HashMap;
use std::time::Duration;

use kilo_core::notification::{Notification, NotificationId};
use kilo_core::resolution::Resolution;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::engine;
use crate::error::ResolveError;
use crate::reconciler::Reconciler;
use crate::render::render_card;
use crate::resolver::{ActionResolver, Draft, Phase};
use crate::util::EXIT_OK;

const HELP: &str = "\
commands:
  complete <id> [notes]          mark done
  skip <id> [notes]              record as skipped
  snooze <id>                    show snooze durations
  snooze <id> <minutes> [notes]  snooze for 5, 15, 30 or 60 minutes
  back <id>                      leave the snooze menu
  note <id> <text>               set notes for the next action
  dismiss <id>                   mark read without an outcome
  list | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    /// Completed or skipped; snoozing goes through the menu variants.
    Resolve {
        id: NotificationId,
        resolution: Resolution,
        notes: Option<String>,
    },
    SnoozeMenu(NotificationId),
    Snooze {
        id: NotificationId,
        minutes: u32,
        notes: Option<String>,
    },
    Back(NotificationId),
    Note {
        id: NotificationId,
        text: String,
    },
    Dismiss(NotificationId),
    List,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<WatchCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(WatchCommand::List);
    };
    let verb = verb.to_ascii_lowercase();

    match verb.as_str() {
        "list" | "ls" => return Ok(WatchCommand::List),
        "help" | "?" => return Ok(WatchCommand::Help),
        "quit" | "exit" | "q" => return Ok(WatchCommand::Quit),
        _ => {}
    }

    let id = words
        .next()
        .ok_or_else(|| format!("'{verb}' needs a notification id"))?
        .parse::<NotificationId>()
        .map_err(|_| format!("'{verb}' needs a numeric notification id"))?;
    let rest: Vec<&str> = words.collect();

    match verb.as_str() {
        "complete" | "done" => Ok(WatchCommand::Resolve {
            id,
            resolution: Resolution::Completed,
            notes: join_notes(&rest),
        }),
        "skip" => Ok(WatchCommand::Resolve {
            id,
            resolution: Resolution::Skipped,
            notes: join_notes(&rest),
        }),
        "snooze" => match rest.split_first() {
            None => Ok(WatchCommand::SnoozeMenu(id)),
            Some((minutes, tail)) => {
                let minutes = minutes
                    .trim_end_matches('m')
                    .parse::<u32>()
                    .map_err(|_| format!("'{minutes}' is not a number of minutes"))?;
                Ok(WatchCommand::Snooze {
                    id,
                    minutes,
                    notes: join_notes(tail),
                })
            }
        },
        "back" => Ok(WatchCommand::Back(id)),
        "note" | "notes" => Ok(WatchCommand::Note {
            id,
            text: rest.join(" "),
        }),
        "dismiss" => Ok(WatchCommand::Dismiss(id)),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

fn join_notes(parts: &[&str]) -> Option<String> {
    let joined = parts.join(" ");
    (!joined.is_empty()).then_some(joined)
}

/// One resolver per displayed notification, in held order.
#[derive(Default)]
struct View {
    cards: Vec<ActionResolver>,
}

impl View {
    /// Keeps existing resolvers (and their drafts) for ids still held and
    /// creates fresh ones for new ids.
    fn sync(&mut self, held: &[Notification], reconciler: &Reconciler) {
        let mut existing: HashMap<NotificationId, ActionResolver> =
            self.cards.drain(..).map(|r| (r.id(), r)).collect();
        self.cards = held
            .iter()
            .map(|n| {
                existing
                    .remove(&n.id)
                    .unwrap_or_else(|| ActionResolver::new(n.clone(), reconciler.clone()))
            })
            .collect();
    }

    fn find(&self, id: NotificationId) -> Option<&ActionResolver> {
        self.cards.iter().find(|r| r.id() == id)
    }

    fn print(&self) {
        if self.cards.is_empty() {
            println!("-- no pending notifications --");
            return;
        }
        println!("-- {} pending --", self.cards.len());
        for card in &self.cards {
            println!("{}", render_card(card.notification(), card.phase(), &card.draft()));
        }
    }
}

type Completion = (NotificationId, Result<Phase, ResolveError>);

fn spawn_action(resolver: &ActionResolver, command: WatchCommand, done: mpsc::UnboundedSender<Completion>) {
    let resolver = resolver.clone();
    tokio::spawn(async move {
        let id = resolver.id();
        let result = match command {
            WatchCommand::Resolve { resolution, notes, .. } => {
                if let Some(notes) = notes {
                    resolver.update_draft(|d| d.set_notes(notes));
                }
                resolver.submit(resolution).await
            }
            WatchCommand::Snooze { minutes, notes, .. } => {
                if let Some(notes) = notes {
                    resolver.update_draft(|d| d.set_notes(notes));
                }
                resolver.choose_snooze(minutes).await
            }
            WatchCommand::Dismiss(_) => resolver.dismiss().await,
            _ => return,
        };
        let _ = done.send((id, result));
    });
}

pub async fn run(reconciler: Reconciler, poll_interval: Duration) -> i32 {
    let (changes_tx, mut changes_rx) = mpsc::unbounded_channel::<Vec<Notification>>();
    reconciler.subscribe(move |held| {
        let _ = changes_tx.send(held.to_vec());
    });
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

    let engine = engine::start(reconciler.clone(), poll_interval);
    let mut view = View::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    eprintln!("{HELP}");

    loop {
        tokio::select! {
            Some(held) = changes_rx.recv() => {
                view.sync(&held, &reconciler);
                view.print();
            }
            Some((id, result)) = done_rx.recv() => {
                match result {
                    Ok(Phase::Failed) => println!("#{id}: request failed, try again"),
                    Ok(_) => {}
                    Err(e) => println!("#{id}: {e}"),
                }
                view.print();
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_command(&line) {
                    Ok(WatchCommand::Quit) => break,
                    Ok(WatchCommand::List) => view.print(),
                    Ok(WatchCommand::Help) => println!("{HELP}"),
                    Ok(command) => handle(&view, command, &done_tx),
                    Err(message) => println!("{message}"),
                },
                Ok(None) => {
                    tracing::debug!("stdin closed; continuing to poll");
                    stdin_open = false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read stdin");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    if let Err(e) = engine.shutdown().await {
        tracing::warn!(error = %e, "polling task did not shut down cleanly");
    }
    EXIT_OK
}

fn handle(view: &View, command: WatchCommand, done: &mpsc::UnboundedSender<Completion>) {
    let id = match &command {
        WatchCommand::Resolve { id, .. }
        | WatchCommand::Snooze { id, .. }
        | WatchCommand::Note { id, .. } => *id,
        WatchCommand::SnoozeMenu(id) | WatchCommand::Back(id) | WatchCommand::Dismiss(id) => *id,
        WatchCommand::List | WatchCommand::Help | WatchCommand::Quit => return,
    };
    let Some(resolver) = view.find(id) else {
        println!("#{id} is not pending");
        return;
    };

    match command {
        WatchCommand::SnoozeMenu(_) => {
            resolver.update_draft(Draft::open_snooze_menu);
            view.print();
        }
        WatchCommand::Back(_) => {
            resolver.update_draft(Draft::back);
            view.print();
        }
        WatchCommand::Note { text, .. } => {
            resolver.update_draft(|d| d.set_notes(text));
            view.print();
        }
        action => spawn_action(resolver, action, done.clone()),
    }
}
