extern crate thiserror;

extern crate nom;
extern crate nom_locate;

pub mod cmd;
pub mod compiler;
pub mod repl;
pub mod vm;

use std::path::PathBuf;

pub const PEPPER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per user configuration directory, falls back to `.pepper` in the working directory.
pub fn pepper_config_directory() -> PathBuf {
    match directories::ProjectDirs::from("org", "pepper", "pepper") {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => PathBuf::from(".pepper"),
    }
}

#[cfg(test)]
#[macro_use]
extern crate matches;

#[cfg(test)]
extern crate quickcheck;

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
