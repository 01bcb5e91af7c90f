pub mod config;
pub mod console;
pub mod presenter;
pub mod question_adapter;
