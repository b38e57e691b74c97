// Meetings: slot proposals, scheduling emails, and bookings.

pub mod handlers;
pub mod prompts;
pub mod slots;
