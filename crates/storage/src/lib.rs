//! Storage backends for Heron.
//!
//! `SupabaseStore` implements vector search (the `memory_search` RPC)
//! and the append-only message log over the Supabase REST surface.
//! `NoopStore` stands in when Supabase is unconfigured — the bot still
//! answers, just without long-term memory.

pub mod noop;
pub mod supabase;

pub use noop::NoopStore;
pub use supabase::SupabaseStore;
