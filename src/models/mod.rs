pub mod decision;
pub mod expense;
pub mod job;
pub mod preferences;
pub mod profile;
pub mod safety;
pub mod session;
