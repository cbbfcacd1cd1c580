use std::path::PathBuf;

use crate::domain::types::LaunchCommand;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinAction {
    LaunchAll,
    LaunchGateway,
    LaunchAdapter,
    LaunchCore,
    LaunchWebConsole,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Builtin(BuiltinAction),
    /// Any other program, started through the same detached launcher.
    External {
        label: String,
        working_dir: PathBuf,
        command: LaunchCommand,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEntry {
    pub key: String,
    pub description: String,
    pub action: Action,
}

/// Stable keys mapped to launch actions, kept in registration order.
#[derive(Clone, Debug, Default)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.register(
            "all",
            "Start NapCat, adapter and MaiBot",
            Action::Builtin(BuiltinAction::LaunchAll),
        );
        table.register(
            "gateway",
            "Start NapCat only",
            Action::Builtin(BuiltinAction::LaunchGateway),
        );
        table.register(
            "adapter",
            "Start the NapCat adapter only",
            Action::Builtin(BuiltinAction::LaunchAdapter),
        );
        table.register(
            "core",
            "Start MaiBot only",
            Action::Builtin(BuiltinAction::LaunchCore),
        );
        table.register(
            "webui",
            "Start the web console",
            Action::Builtin(BuiltinAction::LaunchWebConsole),
        );
        table
    }

    /// Adds an entry, or replaces the action and description of an existing key in place.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        description: impl Into<String>,
        action: Action,
    ) {
        let key = key.into();
        let description = description.into();
        if let Some(existing) = self.entries.iter_mut().find(|entry| entry.key == key) {
            existing.description = description;
            existing.action = action;
            return;
        }
        self.entries.push(CommandEntry {
            key,
            description,
            action,
        });
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != key);
        self.entries.len() != before
    }

    pub fn resolve(&self, key: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }
}
