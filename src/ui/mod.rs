mod app;
mod render;
mod state;

pub use app::App;
