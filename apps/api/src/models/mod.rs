pub mod meeting;
pub mod outreach;
pub mod prospect;
