use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API key for the completion provider
    #[arg(long, env = "OPENAI_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Base URL for the completion provider API (defaults to the OpenAI endpoint)
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// Model identifier sent with every completion request
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4-turbo")]
    pub chat_model: String,

    /// Maximum output tokens requested per completion
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "1000")]
    pub chat_max_tokens: u32,

    // --- Server Args ---
    /// Host address and port for the gateway to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    // --- Client Mode Args ---
    /// Run the interactive terminal client against the given gateway URL instead of serving.
    #[arg(long, env = "CLIENT_URL")]
    pub client_url: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
