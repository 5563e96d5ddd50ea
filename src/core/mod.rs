pub mod app;
pub mod context;
pub mod data;
pub mod discover;
pub mod reload;
pub mod render;
