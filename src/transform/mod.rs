//! Normalization of raw backend payloads into canonical entities.

pub(crate) mod drug;
