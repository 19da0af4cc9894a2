use clap::Parser;
use pepper::cmd;

// sysexits EX_IOERR, used when the input can't be read
const EXIT_IO_ERROR: i32 = 74;

fn main() {
    pretty_env_logger::init();
    let opts = cmd::Opts::parse();

    match cmd::execute(&opts) {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_IO_ERROR);
        }
    }
}
