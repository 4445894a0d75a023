pub mod dao;
pub mod queue;
