use std::path::Path;

use anyhow::Result;

use socksd_rs::{Config, ProxyServer, cli};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse_args()?;

    let config = if Path::new(&args.config_file).exists() {
        Config::load(&args.config_file).await?
    } else {
        Config::default()
    };

    if args.config_test {
        println!("configuration OK");
        return Ok(());
    }

    let server = ProxyServer::bind(&config).await?;
    server.serve().await
}
