//! magicform-core: question model, translation, and form building.
//!
//! This crate defines the question data model, the Google Forms wire types,
//! the question-to-request translation and the orchestration that turns a
//! question list into a quiz form through any [`traits::FormsService`].

pub mod builder;
pub mod error;
pub mod forms;
pub mod model;
pub mod parser;
pub mod traits;
pub mod translate;

pub use error::FormsError;
