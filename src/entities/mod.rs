//! Domain types shared by the controller, the HTTP client, and the renderers.

pub mod drug;
