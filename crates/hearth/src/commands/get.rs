//! Get command - print one session.

use anyhow::{Result, bail};
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Session key
    pub key: String,
}

/// Run the get command.
pub fn run(args: GetArgs, ctx: &Context) -> Result<()> {
    let mut conn = ctx.open_store()?;

    let value = match conn.read(&args.key) {
        Ok(value) => value,
        Err(e) if e.is_not_found() => {
            conn.close()?;
            bail!("session '{}' not found", args.key);
        }
        Err(e) => return Err(e.into()),
    };

    match value {
        Some(map) if ctx.json_output => println!("{}", serde_json::to_string(&map)?),
        Some(map) => println!("{}", serde_json::to_string_pretty(&map)?),
        None if ctx.json_output => println!("null"),
        None => {
            let dim = Style::new().dim();
            println!("{}", dim.apply_to("(undecodable value, treated as empty)"));
        }
    }

    conn.close()?;
    Ok(())
}
