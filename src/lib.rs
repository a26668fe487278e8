//! Student grade records: letter-grade classification, credit-weighted
//! GPA/CGPA, and a validated gradebook with role-based access.

pub mod access;
pub mod config;
pub mod gradebook;
pub mod grading;
pub mod logging;
pub mod output;
