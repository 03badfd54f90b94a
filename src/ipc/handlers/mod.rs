pub mod akos;
pub mod core;
pub mod skema;
pub mod worktime;
