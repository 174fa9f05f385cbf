//! Line commands that drive the launcher the way pointer and keyboard input
//! would: every command turns into one or more [`ViewEvent`]s.

use std::{path::PathBuf, str::FromStr, time::Instant};

use launchpad_core::{ProfileField, Translator, profile::UnknownField, rows};
use thiserror::Error;

use crate::launcher::{Launcher, LauncherError, ViewEvent};

pub const HELP: &str = "\
commands:
  add                          add a server at the top
  edit <row> <field> <value>   change name|udp|https of a row
  toggle <row>                 toggle nickname editing
  remove <row>                 remove a row
  play <row>                   launch a row
  drag <from> <to>             move a row
  lang <id>                    switch language
  tab <name>                   switch tab (servers, clients, settings)
  client add <path>            register a client executable
  dismiss                      close the newest error
  show                         print the view
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Add,
    Edit {
        row: usize,
        field: ProfileField,
        value: String,
    },
    Toggle(usize),
    Remove(usize),
    Play(usize),
    Drag {
        from: usize,
        to: usize,
    },
    Language(String),
    Tab(String),
    AddClient(PathBuf),
    Dismiss,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("`{0}` is not a row number")]
    BadRow(String),
    #[error(transparent)]
    Field(#[from] UnknownField),
    #[error("there is no row {0}")]
    NoSuchRow(usize),
    #[error("row {0} nickname is read-only, `toggle {0}` first")]
    ReadOnly(usize),
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
    #[error("unknown tab `{0}`")]
    UnknownTab(String),
    #[error("no error is showing")]
    NoModal,
    #[error(transparent)]
    Launcher(#[from] LauncherError),
}

impl ShellError {
    /// Whether the launcher itself broke, as opposed to a bad command line.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Launcher(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    Done,
    Print(String),
    Quit,
}

impl FromStr for ShellCommand {
    type Err = ShellError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = split_word(line);
        match verb {
            "" => Err(ShellError::Empty),
            "add" => Ok(ShellCommand::Add),
            "edit" => {
                const USAGE: &str = "edit <row> <field> <value>";
                let (row, rest) = split_word(rest);
                let (field, value) = split_word(rest);
                if field.is_empty() {
                    return Err(ShellError::Usage(USAGE));
                }
                Ok(ShellCommand::Edit {
                    row: parse_row(row, USAGE)?,
                    field: field.parse()?,
                    value: value.to_owned(),
                })
            }
            "toggle" => Ok(ShellCommand::Toggle(parse_row(rest, "toggle <row>")?)),
            "remove" => Ok(ShellCommand::Remove(parse_row(rest, "remove <row>")?)),
            "play" => Ok(ShellCommand::Play(parse_row(rest, "play <row>")?)),
            "drag" => {
                const USAGE: &str = "drag <from> <to>";
                let (from, to) = split_word(rest);
                Ok(ShellCommand::Drag {
                    from: parse_row(from, USAGE)?,
                    to: parse_row(to, USAGE)?,
                })
            }
            "lang" => match rest {
                "" => Err(ShellError::Usage("lang <id>")),
                id => Ok(ShellCommand::Language(id.to_owned())),
            },
            "tab" => match rest {
                "" => Err(ShellError::Usage("tab <name>")),
                name => Ok(ShellCommand::Tab(name.to_owned())),
            },
            "client" => match split_word(rest) {
                ("add", path) if !path.is_empty() => Ok(ShellCommand::AddClient(path.into())),
                _ => Err(ShellError::Usage("client add <path>")),
            },
            "dismiss" => Ok(ShellCommand::Dismiss),
            "show" => Ok(ShellCommand::Show),
            "help" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(ShellError::UnknownCommand(other.to_owned())),
        }
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn parse_row(word: &str, usage: &'static str) -> Result<usize, ShellError> {
    let word = word.trim();
    if word.is_empty() {
        return Err(ShellError::Usage(usage));
    }
    word.parse()
        .map_err(|_| ShellError::BadRow(word.to_owned()))
}

/// Run `command` against `launcher` as if the user had done it by hand.
pub fn apply<T: Translator>(
    launcher: &mut Launcher<T>,
    command: ShellCommand,
    now: Instant,
) -> Result<ShellOutcome, ShellError> {
    match command {
        ShellCommand::Add => {
            let button = launcher.layout().add_profile;
            launcher.handle_event(ViewEvent::Click(button), now)?;
        }
        ShellCommand::Edit { row, field, value } => {
            let target = row_at(launcher, row)?.field_node(field);
            if rows::is_read_only(launcher.tree(), target) {
                return Err(ShellError::ReadOnly(row));
            }
            launcher.handle_event(ViewEvent::Input { node: target, value }, now)?;
        }
        ShellCommand::Toggle(row) => {
            let button = row_at(launcher, row)?.edit_toggle;
            launcher.handle_event(ViewEvent::Click(button), now)?;
        }
        ShellCommand::Remove(row) => {
            let button = row_at(launcher, row)?.remove;
            launcher.handle_event(ViewEvent::Click(button), now)?;
        }
        ShellCommand::Play(row) => {
            let button = row_at(launcher, row)?.play;
            launcher.handle_event(ViewEvent::Click(button), now)?;
        }
        ShellCommand::Drag { from, to } => {
            let dragged = row_at(launcher, from)?.root;
            let target = row_at(launcher, to)?.root;
            let bounds = launcher
                .tree()
                .bounds(target)
                .ok_or(ShellError::NoSuchRow(to))?;
            // Above the target's midpoint lands before it, below lands after.
            let pointer_y = if to <= from {
                bounds.top + 1.0
            } else {
                bounds.midpoint() + 1.0
            };
            launcher.handle_event(ViewEvent::DragStart(dragged), now)?;
            launcher.handle_event(ViewEvent::DragOver { pointer_y }, now)?;
            launcher.handle_event(ViewEvent::DragEnd(dragged), now)?;
        }
        ShellCommand::Language(language) => {
            if !launcher.has_language(&language) {
                return Err(ShellError::UnknownLanguage(language));
            }
            let select = launcher.layout().language_select;
            launcher.handle_event(
                ViewEvent::Change {
                    node: select,
                    value: language,
                },
                now,
            )?;
        }
        ShellCommand::Tab(name) => {
            let tab = launcher
                .tab_button(&name)
                .ok_or(ShellError::UnknownTab(name))?;
            launcher.handle_event(ViewEvent::Click(tab), now)?;
        }
        ShellCommand::AddClient(path) => {
            let layout = *launcher.layout();
            launcher.handle_event(
                ViewEvent::Input {
                    node: layout.client_path,
                    value: path.display().to_string(),
                },
                now,
            )?;
            launcher.handle_event(ViewEvent::Click(layout.add_client), now)?;
        }
        ShellCommand::Dismiss => {
            let modal = launcher.modals().last().copied().ok_or(ShellError::NoModal)?;
            let tree = launcher.tree();
            let button = tree
                .descendants(modal)
                .into_iter()
                .find(|node| tree.has_class(*node, "dismiss"))
                .ok_or(ShellError::NoModal)?;
            launcher.handle_event(ViewEvent::Click(button), now)?;
        }
        ShellCommand::Show => {
            let tree = launcher.tree();
            return Ok(ShellOutcome::Print(tree.outline(tree.root())));
        }
        ShellCommand::Help => return Ok(ShellOutcome::Print(HELP.to_owned())),
        ShellCommand::Quit => return Ok(ShellOutcome::Quit),
    }
    Ok(ShellOutcome::Done)
}

fn row_at<T: Translator>(launcher: &Launcher<T>, index: usize) -> Result<rows::ProfileRow, ShellError> {
    launcher
        .row_at(index)
        .copied()
        .ok_or(ShellError::NoSuchRow(index))
}
