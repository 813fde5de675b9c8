use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    xrpl_saga_cli::run().await?;
    Ok(())
}
