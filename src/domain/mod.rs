pub mod actor;
pub mod rules;
