//! Browser front end: authorize once, then upload a questions file and get a
//! quiz form back.

pub mod html;
pub mod server;

pub use server::{router, serve, AppState, WebError};
