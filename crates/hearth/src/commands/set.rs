//! Set command - store one session.

use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use console::Style;
use hearth_session::SessionMap;

use super::Context;

/// Arguments for the set command.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Session key
    pub key: String,

    /// Session value as a JSON object
    pub value: String,

    /// Time to live in seconds (default: the store's expiry)
    #[arg(long, default_value = "0")]
    pub ttl: u64,
}

/// Run the set command.
pub fn run(args: SetArgs, ctx: &Context) -> Result<()> {
    let value: SessionMap =
        serde_json::from_str(&args.value).context("value must be a JSON object")?;

    let mut conn = ctx.open_store()?;
    conn.write(&args.key, &value, Duration::from_secs(args.ttl))?;
    conn.close()?;

    if ctx.json_output {
        println!("{}", serde_json::json!({ "stored": args.key }));
    } else {
        let green = Style::new().green();
        println!("{} Stored {}", green.apply_to("✓"), args.key);
    }
    Ok(())
}
