pub mod buyers;
pub mod export;
pub mod import;
pub mod tags;
