pub mod backend;
pub mod demo;

pub use backend::build_backend;
pub use demo::SheepDemo;
