//! The Heron reply pipeline.
//!
//! `Dispatcher` drives one webhook delivery through admission, the
//! fast-path command table, memory retrieval, prompt assembly, the
//! resilient upstream call, and delivery of the reply. The collaborators
//! are all trait objects, so tests run the whole pipeline against
//! hand-rolled mocks.

pub mod assembler;
pub mod commands;
pub mod dispatcher;
pub mod retriever;

pub use assembler::PromptAssembler;
pub use commands::fast_reply;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use retriever::MemoryRetriever;
