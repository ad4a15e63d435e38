//! Delete command - remove one session.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Session key
    pub key: String,
}

/// Run the delete command.
pub fn run(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let mut conn = ctx.open_store()?;
    let result = conn.delete(&args.key);
    conn.close()?;

    match result {
        Ok(()) => {
            if ctx.json_output {
                println!("{}", serde_json::json!({ "deleted": args.key }));
            } else {
                let green = Style::new().green();
                println!("{} Deleted {}", green.apply_to("✓"), args.key);
            }
            Ok(())
        }
        Err(e) if e.is_not_found() => anyhow::bail!("session '{}' not found", args.key),
        Err(e) => Err(e.into()),
    }
}
