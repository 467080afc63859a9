// src/commands/mod.rs
//! Command handlers for the ros2nix CLI

mod generate;

pub use generate::cmd_generate;
