pub mod grants;
pub mod wikiprojects;
