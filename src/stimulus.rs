use std::collections::HashMap;
use std::fmt::Display;

/// Integer handle bound to one registered stimulus-load command.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StimAlias(usize);

impl StimAlias {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for StimAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "stim{}", self.0)
    }
}

/// Append-only table of stimulus-load commands for one synthesis session.
///
/// Commands are compared by their exact text, so two requests share a load only
/// if they agree on the waveform, scope, time window and segmentation.
#[derive(Debug, Default, Clone)]
pub struct StimulusRegistry {
    commands: Vec<String>,
    index: HashMap<String, StimAlias>,
}

impl StimulusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the alias of `load_command`, and whether it was registered by this call.
    pub fn register(&mut self, load_command: &str) -> (StimAlias, bool) {
        if let Some(alias) = self.index.get(load_command) {
            return (*alias, false);
        }
        let alias = StimAlias(self.commands.len());
        self.commands.push(load_command.to_string());
        self.index.insert(load_command.to_string(), alias);
        (alias, true)
    }

    pub fn get(&self, load_command: &str) -> Option<StimAlias> {
        self.index.get(load_command).copied()
    }

    pub fn command(&self, alias: StimAlias) -> Option<&str> {
        self.commands.get(alias.0).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
