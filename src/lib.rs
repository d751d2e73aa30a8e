//! curator: a personal web content library with semantic search and chat
//!
//! The pipeline: fetch or accept content, extract readable text, chunk it,
//! embed the chunks with an OpenAI-compatible API, and store everything in
//! SQLite (metadata) plus Qdrant (vectors). On top of that sit semantic
//! search, retrieval-augmented chat and LLM library analysis.

pub mod analyze;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod crawl;
pub mod embed;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod meta;
pub mod parse;
pub mod progress;
pub mod rag;
pub mod store;
