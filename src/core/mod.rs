// src/core/mod.rs

pub mod html;
pub mod number;
pub mod sanitize;
