//! neokat - a menu-driven installer for Kali Linux tools
//!
//! This library exposes the core modules for use by the binaries and tests.

pub mod apt;
pub mod catalog;
pub mod config;
pub mod console;
pub mod error;
pub mod executor;
pub mod help;
pub mod interrupt;
pub mod privilege;
pub mod repo;
pub mod reporter;
pub mod scripts;
pub mod selector;
pub mod shell;
pub mod types;
