pub mod chat;
pub mod context;
pub mod core;
pub mod document;
pub mod files;
pub mod ingest;
pub mod llm;
pub mod loader;
pub mod rag;
pub mod search;
pub mod server;
pub mod state;
