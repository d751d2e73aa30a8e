//! Default values for configuration

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default collection name
pub fn default_collection_name() -> String {
    "curator_content".to_string()
}

/// Default OpenAI-compatible API base URL
pub fn default_api_base() -> String {
    std::env::var("CURATOR_API_BASE").unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

/// Default environment variable name holding the API key
pub fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default chat model
pub fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

/// Default API request timeout in seconds
pub fn default_request_timeout() -> u64 {
    60
}

/// Default embedding dimension (text-embedding-ada-002)
pub fn default_embedding_dimension() -> usize {
    1536
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default maximum characters per chunk
pub fn default_chunk_max_chars() -> usize {
    1000
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    200
}

/// Default minimum characters per chunk
pub fn default_chunk_min_chars() -> usize {
    50
}

/// Default maximum pages per crawl
pub fn default_crawl_max_pages() -> u32 {
    5
}

/// Hard upper bound on pages per crawl
pub const CRAWL_MAX_PAGES_LIMIT: u32 = 20;

/// Default rate limit (requests per second per host)
pub fn default_crawl_rate_limit() -> f64 {
    1.0
}

/// Default user agent
pub fn default_crawl_user_agent() -> String {
    format!("curator/{} (Personal Content Inventory)", env!("CARGO_PKG_VERSION"))
}

/// Default request timeout in seconds
pub fn default_crawl_timeout() -> u64 {
    10
}

/// Default: respect robots.txt
pub fn default_respect_robots() -> bool {
    true
}

/// Default maximum characters kept per fetched page
pub fn default_max_content_chars() -> usize {
    50_000
}

/// Default number of chunks retrieved per question
pub fn default_chat_top_k() -> usize {
    5
}

/// Default chat temperature
pub fn default_chat_temperature() -> f32 {
    0.7
}

/// Default number of past question/answer turns kept in memory
pub fn default_max_history_turns() -> usize {
    10
}

/// Default: summaries enabled
pub fn default_summary_enabled() -> bool {
    true
}

/// Default summary temperature
pub fn default_summary_temperature() -> f32 {
    0.3
}
