#![allow(clippy::enum_variant_names)]

//! Client-side cache and tree view over a remote file listing.

pub mod application;
pub mod cli;
pub mod config;
pub mod filesystem;
pub mod remote;
pub mod system_files;
