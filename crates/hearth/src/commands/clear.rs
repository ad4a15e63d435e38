//! Clear command - remove every session under a prefix.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the clear command.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Key prefix; every session whose key starts with it is removed
    pub prefix: String,
}

/// Run the clear command.
pub fn run(args: ClearArgs, ctx: &Context) -> Result<()> {
    let mut conn = ctx.open_store()?;
    conn.clear(&args.prefix)?;
    conn.close()?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "cleared": args.prefix }));
    } else {
        let green = Style::new().green();
        println!("{} Cleared '{}'", green.apply_to("✓"), args.prefix);
    }
    Ok(())
}
