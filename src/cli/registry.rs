use std::collections::HashMap;

use async_trait::async_trait;

use crate::app::{AppContext, GatorError, Result};

/// A command name plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: &str, args: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            args,
        }
    }

    /// Required positional argument, returned as typed; missing or blank is
    /// a usage error.
    pub fn arg(&self, idx: usize, usage: &'static str) -> Result<&str> {
        self.args
            .get(idx)
            .map(String::as_str)
            .filter(|a| !a.trim().is_empty())
            .ok_or(GatorError::MissingArgument { usage })
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &mut AppContext, cmd: &Command) -> Result<()>;
}

/// Name → handler table, built once at startup.
#[derive(Default)]
pub struct Commands {
    handlers: HashMap<String, Box<dyn CommandHandler>>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering a name twice replaces the earlier handler.
    pub fn register<H: CommandHandler + 'static>(&mut self, name: &str, handler: H) {
        self.handlers.insert(name.to_string(), Box::new(handler));
    }

    /// Dispatch `cmd`. Non-fatal handler errors come back wrapped with the
    /// command name.
    pub async fn run(&self, ctx: &mut AppContext, cmd: &Command) -> Result<()> {
        let handler = self
            .handlers
            .get(&cmd.name)
            .ok_or_else(|| GatorError::UnknownCommand(cmd.name.clone()))?;

        handler.run(ctx, cmd).await.map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                GatorError::Command {
                    name: cmd.name.clone(),
                    source: Box::new(e),
                }
            }
        })
    }
}

#[cfg(test)]
impl Commands {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub(crate) fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
