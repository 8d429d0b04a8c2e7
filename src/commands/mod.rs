pub mod all;
pub mod domain;
pub mod status;

use std::path::PathBuf;

use crate::models::SyncConfig;

/// Directories and settings shared by every command
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: SyncConfig,
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}
