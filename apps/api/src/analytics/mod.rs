// Aggregate outreach metrics.

pub mod handlers;
