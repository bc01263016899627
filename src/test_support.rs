// src/test_support.rs
// Shared fixtures for unit tests

use crate::environment::{EnvironmentManager, MODULES_DIR, REQUIRED_FILES};
use crate::nix::NixTool;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

/// A base configuration directory holding every required file
pub fn base_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    for f in REQUIRED_FILES {
        fs::write(dir.path().join(f), format!("# {f}\n")).unwrap();
    }
    fs::create_dir_all(dir.path().join(MODULES_DIR)).unwrap();
    fs::write(dir.path().join(MODULES_DIR).join("default.nix"), "{ }\n").unwrap();
    dir
}

/// `sh -c <script> nix <args...>`: the script sees the nix args as $@
pub fn fake_tool(script: &str) -> NixTool {
    NixTool::new(
        "sh",
        vec!["-c".to_string(), script.to_string(), "nix".to_string()],
        Duration::from_secs(5),
    )
}

pub struct Fixture {
    pub base: TempDir,
    pub work: TempDir,
    pub envs: EnvironmentManager,
}

pub fn fixture() -> Fixture {
    let base = base_dir();
    let work = TempDir::new().unwrap();
    let envs = EnvironmentManager::new(base.path(), work.path());
    Fixture { base, work, envs }
}
