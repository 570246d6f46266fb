pub mod maintenance;
pub mod summary;
