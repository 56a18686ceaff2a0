pub mod automation;
pub mod expenses;
pub mod lifecycle;
pub mod planning;
pub mod punch;
pub mod queue;
pub mod revenue;
pub mod safety;
pub mod scoring;
