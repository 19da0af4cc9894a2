pub mod command;
pub mod word_completer;

use crate::cmd::report_error;
use crate::pepper_config_directory;
use crate::repl::command::{CommandCompleter, Commands};
use crate::repl::word_completer::WordCompleter;
use crate::vm::VM;
use crate::PEPPER_VERSION;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::ValidationContext;
use rustyline::validate::ValidationResult;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use std::borrow::Cow;
use std::io::Write;

pub struct Repl {
    vm: VM,
    commands: Commands,
    editor: Editor<ReplHelper>,
}

pub struct ReplHelper {
    bindings_completer: WordCompleter,
    command_completer: CommandCompleter,
    bracket_validator: rustyline::validate::MatchingBracketValidator,
    bracket_highlighter: rustyline::highlight::MatchingBracketHighlighter,
}

impl ReplHelper {
    pub fn new<W: Write>(vm: &VM<W>) -> Self {
        Self {
            bindings_completer: WordCompleter::from(vm.binding_names()),
            command_completer: CommandCompleter::new(),
            bracket_validator: rustyline::validate::MatchingBracketValidator::new(),
            bracket_highlighter: rustyline::highlight::MatchingBracketHighlighter::new(),
        }
    }

    /// Complete from the bindings `vm` holds right now.
    pub fn update_bindings<W: Write>(&mut self, vm: &VM<W>) {
        self.bindings_completer = WordCompleter::from(vm.binding_names());
    }
}

impl Helper for ReplHelper {}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context) -> Option<Self::Hint> {
        self.command_completer.hint(line, pos)
    }
}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, matches) = self.command_completer.complete(line, pos, ctx)?;

        if !matches.is_empty() {
            return Ok((start, matches));
        }

        self.bindings_completer.complete(line, pos, ctx)
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.bracket_highlighter.highlight(line, pos)
    }

    // dim the hinted command tail
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{}\x1b[0m", hint))
    }
}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        self.bracket_validator.validate(ctx)
    }
}

impl Repl {
    pub fn new(vm: VM) -> anyhow::Result<Self> {
        Self::create_directories()?;

        let editor = Editor::<ReplHelper>::with_config(Self::default_config());
        let commands = Commands::new();

        Ok(Self {
            vm,
            editor,
            commands,
        })
    }

    // main read-eval-print loop
    pub fn run_loop(&mut self) -> anyhow::Result<()> {
        if let Err(e) = self.editor.load_history(&Self::history_path()) {
            log::debug!("no history loaded: {}", e);
        }
        self.banner();
        self.editor.set_helper(Some(ReplHelper::new(&self.vm)));

        loop {
            let prompt = self.prompt();
            match self.editor.readline(&prompt) {
                Ok(input) => {
                    if let Err(e) = self.handle_input(&input) {
                        eprintln!("{}", e);
                    }
                    if let Some(helper) = self.editor.helper_mut() {
                        helper.update_bindings(&self.vm);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    println!("Error: {:?}", err);
                    break;
                }
            }
        }

        self.editor.save_history(&Self::history_path())?;
        Ok(())
    }

    fn banner(&self) {
        println!("PEPPER - a tiny byte code interpreter");
        println!("Version: {}\n", PEPPER_VERSION);
        println!("Type :help for help.");
    }

    fn handle_input(&mut self, input: &str) -> anyhow::Result<()> {
        if input.trim().is_empty() {
            return Ok(());
        }

        if !self.commands.dispatch(input, &mut self.vm)? {
            self.eval(input)?
        }
        Ok(())
    }

    // the value of the expression is printed by the VM itself
    fn eval(&mut self, source: &str) -> anyhow::Result<()> {
        let result = self.vm.run_string(source);

        // no chunk outlives a line of input
        let freed = self.vm.collect_garbage(&[]);
        log::debug!("freed {} objects", freed);

        if let Err(e) = result {
            report_error(&e, "repl", source)?;
        }
        Ok(())
    }

    #[inline]
    fn prompt(&self) -> String {
        String::from("> ")
    }

    fn default_config() -> rustyline::config::Config {
        let config_builder = rustyline::config::Config::builder();

        config_builder
            .auto_add_history(true)
            .history_ignore_dups(true)
            .history_ignore_space(false)
            .max_history_size(500)
            .completion_prompt_limit(100)
            .build()
    }

    fn history_path() -> std::path::PathBuf {
        Self::config_dir().join("history")
    }

    #[inline]
    fn create_directories() -> anyhow::Result<()> {
        std::fs::create_dir_all(Self::config_dir())?;

        if !Self::history_path().exists() {
            std::fs::File::create(Self::history_path())?;
        }

        Ok(())
    }

    #[inline]
    fn config_dir() -> std::path::PathBuf {
        pepper_config_directory().join("repl")
    }
}
