pub mod api;

use crate::cli::Args;
use crate::llm::ChatClient;
use std::error::Error;
use std::sync::Arc;

pub struct Server {
    addr: String,
    client: Arc<dyn ChatClient>,
    args: Args,
}

impl Server {
    pub fn new(addr: String, client: Arc<dyn ChatClient>, args: Args) -> Self {
        Self { addr, client, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(&self.addr, self.client.clone(), &self.args).await
    }
}
