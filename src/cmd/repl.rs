use super::VmOpts;
use crate::repl::Repl;
use crate::vm::Status;
use clap::Args;

#[derive(Args, Debug)]
#[clap(about = "Start the REPL")]
pub struct Opts {
    #[clap(flatten)]
    vm: VmOpts,
}

pub fn execute(opts: &Opts) -> anyhow::Result<Status> {
    let mut repl = Repl::new(opts.vm.build_vm())?;
    repl.run_loop()?;
    Ok(Status::Ok)
}
