#![allow(dead_code)]

pub mod mock_search;

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper struct to run storefront commands in an isolated temp directory
pub struct StorefrontTest {
    pub temp_dir: TempDir,
    binary_path: String,
}

impl StorefrontTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        StorefrontTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_storefront").to_string(),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.binary_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("STOREFRONT_CONFIG")
            .env_remove("STOREFRONT_API_URL")
            .env_remove("STOREFRONT_TOKEN")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute storefront command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join(".storefront").join("config.yaml")
    }

    pub fn write_config(&self, content: &str) {
        let dir = self.temp_dir.path().join(".storefront");
        fs::create_dir_all(&dir).expect("Failed to create .storefront directory");
        fs::write(dir.join("config.yaml"), content).expect("Failed to write config file");
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.config_path()).expect("Failed to read config file")
    }
}
