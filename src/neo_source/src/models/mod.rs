pub mod close_approach;
pub mod neo;
pub mod page;
