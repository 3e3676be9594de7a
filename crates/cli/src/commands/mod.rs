//! CLI Commands

pub mod artifacts;
pub mod capture;
pub mod env;
pub mod report;
pub mod run;
