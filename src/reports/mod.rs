pub mod earnings;
pub mod tax;
