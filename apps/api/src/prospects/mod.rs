// Prospects: CRUD, research enrichment, and lifecycle signals.

pub mod handlers;
pub mod prompts;
pub mod research;
