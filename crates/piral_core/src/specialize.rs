use std::sync::Arc;

use crate::command::{CommandDescriptor, Scope};

/// Derives the scoped view of `commands` for `suffix`.
///
/// A command is kept when its name ends with `suffix`; the kept copy has the
/// trailing suffix removed from its name, and only those aliases that also
/// end with `suffix` survive, likewise stripped. Registry order is kept.
/// Flags and the run handler are shared with the source descriptor.
pub fn specialize(commands: &[CommandDescriptor], suffix: &str) -> Vec<CommandDescriptor> {
    commands
        .iter()
        .filter_map(|command| specialize_command(command, suffix))
        .collect()
}

pub fn specialize_command(command: &CommandDescriptor, suffix: &str) -> Option<CommandDescriptor> {
    let name = command.name.strip_suffix(suffix)?;
    Some(renamed(command, name, suffix))
}

/// Scoped view for `scope`, using its suffix and honouring the `scope` tag.
///
/// A descriptor is kept when its name ends with the scope's suffix and its
/// tag is either absent or `scope`. Descriptors tagged for the other scope
/// are left out even if their name carries this suffix.
pub fn specialize_scope(commands: &[CommandDescriptor], scope: Scope) -> Vec<CommandDescriptor> {
    let suffix = scope.suffix();
    commands
        .iter()
        .filter(|command| command.scope.is_none_or(|tag| tag == scope))
        .filter_map(|command| specialize_command(command, suffix))
        .collect()
}

fn renamed(command: &CommandDescriptor, name: &str, suffix: &str) -> CommandDescriptor {
    let aliases = command
        .aliases
        .iter()
        .filter_map(|alias| alias.strip_suffix(suffix))
        .map(str::to_string)
        .collect();

    CommandDescriptor {
        name: name.to_string(),
        aliases,
        description: command.description,
        arguments: command.arguments,
        scope: command.scope,
        flags: Arc::clone(&command.flags),
        run: Arc::clone(&command.run),
    }
}
