use std::ffi::OsString;
use std::path::Path;

use anyhow::Result;

use crate::apps::Apps;
use crate::command::{CommandDescriptor, View};
use crate::error::CommandError;
use crate::schema::CommandParser;

/// A token claimed by more than one descriptor of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub token: String,
    pub winner: String,
    pub shadowed: String,
}

/// First descriptor in `commands` whose name or alias is `token`.
pub fn resolve<'a>(commands: &'a [CommandDescriptor], token: &str) -> Option<&'a CommandDescriptor> {
    commands.iter().find(|command| command.answers_to(token))
}

pub fn collisions(commands: &[CommandDescriptor]) -> Vec<Collision> {
    let mut found = Vec::new();
    for (index, command) in commands.iter().enumerate() {
        let tokens = std::iter::once(&command.name).chain(&command.aliases);
        for token in tokens {
            if token.is_empty() {
                continue;
            }
            if let Some(winner) = commands[..index]
                .iter()
                .find(|earlier| earlier.answers_to(token))
            {
                found.push(Collision {
                    token: token.clone(),
                    winner: winner.name.clone(),
                    shadowed: command.name.clone(),
                });
            }
        }
    }
    found
}

/// Dispatches argv against one command view.
pub struct Router<'a> {
    view: View,
    commands: &'a [CommandDescriptor],
    apps: &'a dyn Apps,
}

impl<'a> Router<'a> {
    pub fn new(view: View, commands: &'a [CommandDescriptor], apps: &'a dyn Apps) -> Self {
        for collision in collisions(commands) {
            tracing::warn!(
                view = %view,
                token = %collision.token,
                winner = %collision.winner,
                shadowed = %collision.shadowed,
                "command token claimed twice; first registration wins"
            );
        }
        Self {
            view,
            commands,
            apps,
        }
    }

    pub fn resolve(&self, token: &str) -> Result<&'a CommandDescriptor, CommandError> {
        resolve(self.commands, token).ok_or_else(|| CommandError::UnknownCommand {
            token: token.to_string(),
            view: self.view,
        })
    }

    /// Resolves `token`, parses `args` with the command's schema and runs it once.
    pub fn dispatch<I, T>(&self, token: &str, args: I, working_dir: &Path) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let command = self.resolve(token)?;
        tracing::debug!(view = %self.view, token, command = %command.name, "resolved command");

        let options = CommandParser::for_descriptor(command).parse(args, working_dir)?;
        tracing::debug!(command = %command.name, keys = ?options.keys().collect::<Vec<_>>(), "parsed options");

        command.run.run(self.apps, options)
    }
}
