//! # Command Line Interface
//!
//! Subcommands are dispatched from here to the `commands` module.

mod cli;

use env_logger;
use log::error;
use tape2disc::commands;
use tape2disc::commands::CommandError;
use tape2disc::pipeline::{SourceFormat,TargetFormat};

fn run() -> Result<(),Box<dyn std::error::Error>> {
    let main_cmd = cli::build_cli();
    let matches = main_cmd.clone().get_matches();

    if let Some(cmd) = matches.subcommand_matches("completions") {
        return commands::completions::generate(main_cmd,cmd);
    }

    // Conversions in fixed directions
    let fixed = [
        ("uef2inf",SourceFormat::Uef,TargetFormat::Native),
        ("inf2uef",SourceFormat::Native,TargetFormat::Uef),
        ("adf2inf",SourceFormat::Adfs,TargetFormat::Native),
        ("adf2uef",SourceFormat::Adfs,TargetFormat::Uef),
        ("t22inf",SourceFormat::T2,TargetFormat::Native),
        ("t22uef",SourceFormat::T2,TargetFormat::Uef)
    ];
    for (name,sfmt,tfmt) in fixed {
        if let Some(cmd) = matches.subcommand_matches(name) {
            return commands::convert::convert(cmd,sfmt,tfmt);
        }
    }
    if let Some(cmd) = matches.subcommand_matches("convert") {
        return commands::convert::convert_any(cmd);
    }

    // Chunk level edits
    if let Some(cmd) = matches.subcommand_matches("uef-merge") {
        return commands::uef::merge(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("uef-filter") {
        return commands::uef::filter(cmd);
    }
    if let Some(cmd) = matches.subcommand_matches("uef-origin") {
        return commands::uef::origin(cmd);
    }

    error!("No subcommand was found, try `tape2disc --help`");
    return Err(Box::new(CommandError::InvalidCommand));
}

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match run() {
        Err(e) => match e.downcast_ref::<CommandError>() {
            Some(CommandError::NoFilesConverted) => {
                error!("{}",e);
                std::process::exit(2);
            },
            _ => Err(e)
        },
        Ok(()) => Ok(())
    }
}
