use std::path::PathBuf;

/// One named signing key the server accepts tokens from.
#[derive(Debug, Clone)]
pub struct AuthKey {
    pub id: String,
    pub secret: Vec<u8>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub index_dir: PathBuf,
    pub model: String,
    pub recursion_limit: u32,
    pub auth_keys: Vec<AuthKey>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7878,
            index_dir: PathBuf::from("vectorstore"),
            model: "gpt-4-turbo".to_string(),
            recursion_limit: 10,
            auth_keys: Vec::new(),
        }
    }
}
