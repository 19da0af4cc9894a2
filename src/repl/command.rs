use crate::vm::{Setting, VM};
use anyhow::anyhow;
use rustyline::completion::{Completer, Pair};
use rustyline::Context;
use std::io::Write;

const COMMANDS: &[(&str, &str)] = &[
    (":help", "Show help on the available commands"),
    (":set (+|-)setting", "Enable or disable a setting"),
    (":settings", "Show the values of all settings"),
    (":disass expression", "Disassemble the code compiled for `expression`"),
];

pub struct Commands;

impl Commands {
    pub fn new() -> Self {
        Self {}
    }

    /// Run `input` if it is a command.
    ///
    /// Returns false if `input` isn't a command and should be evaluated instead.
    pub fn dispatch<W: Write>(&self, input: &str, vm: &mut VM<W>) -> anyhow::Result<bool> {
        let parts: Vec<&str> = input.trim().split_whitespace().collect();

        if let Some(true) = parts.first().map(|e| e.starts_with(':')) {
            match &parts[..] {
                [":help"] => self.handle_help(),
                [":set", argument] => self.handle_set(argument, vm)?,
                [":settings"] => self.handle_settings(vm),
                [":disass", expression @ ..] if !expression.is_empty() => {
                    self.handle_disass(&expression.join(" "), vm)?
                }
                _ => return Err(anyhow!("Invalid command. Type :help for help.")),
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn handle_help(&self) {
        println!("Available commands: ");
        for (usage, description) in COMMANDS {
            println!("{:<25} {}", usage, description);
        }
    }

    fn handle_set<W: Write>(&self, setting: &str, vm: &mut VM<W>) -> anyhow::Result<()> {
        if let Some(name) = setting.strip_prefix('+') {
            vm.settings.enable(self.parse_setting(name)?);
            Ok(())
        } else if let Some(name) = setting.strip_prefix('-') {
            vm.settings.disable(self.parse_setting(name)?);
            Ok(())
        } else {
            Err(anyhow!(
                "Setting must be a known setting and prefixed with either + or -"
            ))
        }
    }

    fn parse_setting(&self, input: &str) -> anyhow::Result<Setting> {
        input.parse::<Setting>().map_err(|e| anyhow!(e))
    }

    fn handle_settings<W: Write>(&self, vm: &VM<W>) {
        let info = vm
            .settings
            .as_vec()
            .iter()
            .map(|(s, f)| format!("{}: {}", s, if *f { "enabled" } else { "disabled" }))
            .collect::<Vec<_>>()
            .join(" ");

        println!("Settings+> {}", info);
    }

    fn handle_disass<W: Write>(&self, expression: &str, vm: &mut VM<W>) -> anyhow::Result<()> {
        let chunk = vm.compile(expression)?;
        print!("{}", vm.disassemble(&chunk, expression));
        Ok(())
    }
}

impl Default for Commands {
    fn default() -> Self {
        Self::new()
    }
}

/// Completes command names at the start of the line.
pub struct CommandCompleter {
    names: Vec<&'static str>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        let names = COMMANDS
            .iter()
            .filter_map(|(usage, _)| usage.split_whitespace().next())
            .collect();

        Self { names }
    }

    fn complete_command(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let prefix = &line[..pos];

        if !prefix.starts_with(':') || prefix.contains(char::is_whitespace) {
            return (0, vec![]);
        }

        let matches = self
            .names
            .iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();

        (0, matches)
    }

    /// The missing tail of the command being typed, if only one command fits.
    pub fn hint(&self, line: &str, pos: usize) -> Option<String> {
        if pos < line.len() {
            return None;
        }

        match &self.complete_command(line, pos).1[..] {
            [only] if only.replacement.len() > pos => Some(only.replacement[pos..].to_string()),
            _ => None,
        }
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.complete_command(line, pos))
    }
}
