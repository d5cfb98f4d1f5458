//! Command line program for working with `marqetsim` experiments.

#[macro_use]
extern crate log;

extern crate anyhow;
extern crate clap;
extern crate colored;

extern crate marqetsim_core as marqetsim;

pub mod cli;
pub mod exec;
mod util;

use std::process;

use colored::*;

fn main() {
    // Run the program based on user input
    match cli::start(cli::init()) {
        Ok(_) => (),
        Err(e) => {
            println!("{}{}", "error: ".red(), e);
            if e.root_cause().to_string() != e.to_string() {
                println!("Caused by:\n{}", e.root_cause())
            }
            process::exit(1);
        }
    }
}
