pub mod disassemble;
pub mod repl;
pub mod run;

use crate::compiler::error::reporting::ErrorReporter;
use crate::vm::{self, Setting, Status, VM};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(version, about = "The pepper byte code interpreter")]
pub struct Opts {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(run::Opts),
    Repl(repl::Opts),
    Disassemble(disassemble::Opts),
}

/// Switches shared by every command that runs code
#[derive(Args, Debug, Clone, Default)]
pub struct VmOpts {
    /// Print the stack and every instruction to stderr while executing
    #[clap(long)]
    pub trace: bool,

    /// Print the disassembled chunk to stderr before running it
    #[clap(long)]
    pub print_code: bool,
}

impl VmOpts {
    pub fn build_vm(&self) -> VM {
        let mut vm = VM::new();

        if self.trace {
            vm.settings.enable(Setting::TraceExecution);
        }
        if self.print_code {
            vm.settings.enable(Setting::PrintCode);
        }
        vm
    }
}

pub fn execute(opts: &Opts) -> anyhow::Result<Status> {
    match &opts.command {
        Command::Run(opts) => run::execute(opts),
        Command::Repl(opts) => repl::execute(opts),
        Command::Disassemble(opts) => disassemble::execute(opts),
    }
}

/// Print `e` to stderr.
///
/// Compile errors are rendered as diagnostics against `source`.
pub fn report_error(e: &vm::Error, name: &str, source: &str) -> anyhow::Result<()> {
    match e {
        vm::Error::CompilerError(compile_error) => {
            ErrorReporter::new(name, source).report_error(compile_error)?
        }
        other => eprintln!("{}", other),
    }
    Ok(())
}
