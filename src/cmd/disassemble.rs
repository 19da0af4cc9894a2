use super::{report_error, VmOpts};
use crate::vm::Status;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[clap(about = "Compile <input> and print the disassembled byte code")]
pub struct Opts {
    #[clap(parse(from_os_str))]
    input: PathBuf,

    #[clap(flatten)]
    vm: VmOpts,
}

pub fn execute(opts: &Opts) -> anyhow::Result<Status> {
    let source = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("Could not read file {}", opts.input.display()))?;
    let name = opts.input.to_string_lossy();
    let mut vm = opts.vm.build_vm();

    let result = vm.compile(&source);
    match &result {
        Ok(chunk) => print!("{}", vm.disassemble(chunk, &name)),
        Err(e) => report_error(e, &name, &source)?,
    }

    Ok(Status::from(&result))
}
