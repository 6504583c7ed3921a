pub mod app;
mod draw;
