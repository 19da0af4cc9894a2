use super::{report_error, VmOpts};
use crate::vm::Status;
use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[clap(about = "Run the file specified by <input>")]
pub struct Opts {
    #[clap(parse(from_os_str))]
    input: PathBuf,

    #[clap(flatten)]
    vm: VmOpts,
}

pub fn execute(opts: &Opts) -> anyhow::Result<Status> {
    let source = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("Could not read file {}", opts.input.display()))?;
    let mut vm = opts.vm.build_vm();

    let result = vm.run_string(&source);
    if let Err(e) = &result {
        report_error(e, &opts.input.to_string_lossy(), &source)?;
    }

    Ok(Status::from(&result))
}
