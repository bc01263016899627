// src/cli/classify.rs
// `nixfuzz classify`: classify saved diagnostic output

use crate::classifier::ErrorClassifier;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

pub fn run_classify(input: Option<&Path>, test_name: &str) -> Result<()> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let error = ErrorClassifier::new().classify(&text, test_name);
    println!("{}", serde_json::to_string_pretty(&error)?);
    Ok(())
}
