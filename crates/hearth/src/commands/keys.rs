//! Keys command - list live session keys.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the keys command.
#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Only list keys starting with this prefix
    #[arg(default_value = "")]
    pub prefix: String,
}

/// Run the keys command.
pub fn run(args: KeysArgs, ctx: &Context) -> Result<()> {
    let mut conn = ctx.open_store()?;
    let keys = conn.keys(&args.prefix)?;
    conn.close()?;

    if ctx.json_output {
        println!("{}", serde_json::to_string(&keys)?);
    } else if keys.is_empty() {
        let dim = Style::new().dim();
        println!("{}", dim.apply_to("No sessions found"));
    } else {
        for key in &keys {
            println!("{}", key);
        }
        if ctx.verbose {
            let dim = Style::new().dim();
            println!("{}", dim.apply_to(format!("{} key(s)", keys.len())));
        }
    }
    Ok(())
}
