// Prospect engagement lifecycle and follow-up cadence.
// Everything in here is pure: no database, no LLM, no clock reads.

pub mod engine;
pub mod lifecycle;
pub mod models;
