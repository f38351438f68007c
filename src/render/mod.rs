//! Page state and its text renderings.

pub mod json;
pub mod markdown;
pub mod page;
