//! foreman library
//!
//! This module exports the core functionality of foreman for use in
//! integration tests and as a library.

mod migrations;

pub mod config;
pub mod db;
pub mod engine;
pub mod queries;
