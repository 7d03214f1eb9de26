#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

pub const LAYERED: &str = r#"
[[module]]
name = "base"
provides = ["io"]

[[module]]
name = "net"
provides = ["http"]
requires = ["io"]

[[module]]
name = "app"
requires = ["http"]
needs = ["io"]

[[module]]
name = "plugin"
requires = ["scripting"]
"#;

pub const SCRIPTED: &str = r#"
[[module]]
name = "A"
provides = ["x"]

[[module]]
name = "B"
requires = ["x"]

[[step]]
offer = "B"

[[step]]
offer = "A"

[[step]]
retract = "A"
"#;

/// An `admit` invocation isolated from the user's global config.
#[allow(deprecated)]
pub fn admit_cmd(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("admit").unwrap();
    cmd.current_dir(tmp.path())
        .env("ADMIT_CONFIG", tmp.path().join("no-config.toml"))
        .env_remove("RUST_LOG");
    cmd
}

pub fn project(plan: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Admit.toml"), plan).unwrap();
    tmp
}
