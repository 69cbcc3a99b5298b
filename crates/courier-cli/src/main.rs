use anyhow::{bail, Result};
use clap::Parser;
use courier_cli::{init_tracing, run_cli, Cli};
use courier_render::RenderState;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if run_cli(cli).await? == RenderState::Failed {
        bail!("command failed; details were posted to the chat thread");
    }
    Ok(())
}
