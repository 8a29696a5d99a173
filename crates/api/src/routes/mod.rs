//! Route handlers

pub mod attention;
pub mod dashboard;
pub mod images;
