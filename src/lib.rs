#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod cli;
pub mod controller;
pub mod entities;
pub mod error;
pub mod render;
pub mod service;

mod sources;
mod transform;

pub use sources::search_api::{SEARCH_API_BASE, SEARCH_API_BASE_ENV, SearchApiClient};
