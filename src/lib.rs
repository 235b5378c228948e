pub mod cli;
pub mod client;
pub mod history;
pub mod llm;
pub mod models;
pub mod server;

use cli::Args;
use llm::LlmConfig;
use log::info;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(url) = args.client_url.clone() {
        info!("Starting terminal client against: {}", url);
        return client::terminal::run(&url).await;
    }

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Chat Model: {}", args.chat_model);
    info!("Max Output Tokens: {}", args.chat_max_tokens);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("Debug Output: {}", args.debug);
    info!("-------------------------");

    let client = llm::new_client(&LlmConfig::from_args(&args))?;
    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, client, args);
    server.run().await?;

    Ok(())
}
