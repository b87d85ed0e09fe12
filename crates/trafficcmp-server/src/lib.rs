pub mod app;
pub mod error;
pub mod html;
pub mod routes;
pub mod state;
pub mod uploads;
