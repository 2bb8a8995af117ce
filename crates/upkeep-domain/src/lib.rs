//! Domain layer: fleet models, repository traits and maintenance services

pub mod model;
pub mod repository;
pub mod service;
