// src/environment.rs
// Isolated per-test workspaces staged from the base configuration directory

use crate::error::{HarnessError, Result};
use crate::generator::GeneratedConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Files every workspace needs from the base directory
pub const REQUIRED_FILES: [&str; 3] = ["flake.nix", "flake.lock", "hardware-configuration.nix"];

/// Module tree copied alongside the required files
pub const MODULES_DIR: &str = "modules";

/// Well-known file the generated configuration is written to
pub const CONFIG_FILE: &str = "env.nix";

/// Lifecycle of a workspace. `Destroyed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EnvState {
    Created,
    Staged,
    Validated,
    Built,
    Destroyed,
}

/// A workspace owned by exactly one test.
///
/// Dropping a workspace that was never destroyed removes its directory, so
/// every exit path (including panics and early returns) releases it.
#[derive(Debug)]
pub struct TestEnvironment {
    id: String,
    path: PathBuf,
    state: EnvState,
}

impl TestEnvironment {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> EnvState {
        self.state
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    fn transition(&mut self, allowed_from: &[EnvState], to: EnvState) -> Result<()> {
        if allowed_from.contains(&self.state) {
            debug!(env = %self.id, from = %self.state, to = %to, "Environment transition");
            self.state = to;
            Ok(())
        } else {
            Err(HarnessError::InvalidState(format!(
                "cannot move workspace {} from {} to {}",
                self.id, self.state, to
            )))
        }
    }

    /// Record a completed validation. Only a staged workspace can be validated.
    pub fn mark_validated(&mut self) -> Result<()> {
        self.transition(&[EnvState::Staged], EnvState::Validated)
    }

    /// Record a completed build. Validation always comes first.
    pub fn mark_built(&mut self) -> Result<()> {
        self.transition(&[EnvState::Validated], EnvState::Built)
    }

    fn remove_dir(&mut self) -> std::io::Result<()> {
        if self.state == EnvState::Destroyed {
            return Ok(());
        }
        self.state = EnvState::Destroyed;
        match fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if self.state != EnvState::Destroyed {
            if let Err(e) = self.remove_dir() {
                warn!(env = %self.id, error = %e, "Failed to remove workspace on drop");
            }
        }
    }
}

/// Creates and destroys test workspaces.
#[derive(Debug, Clone)]
pub struct EnvironmentManager {
    source_root: PathBuf,
    work_root: PathBuf,
}

impl EnvironmentManager {
    pub fn new(source_root: impl Into<PathBuf>, work_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            work_root: work_root.into(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Check the base directory holds everything a workspace needs.
    pub fn verify_source(&self) -> Result<()> {
        verify_base_dir(&self.source_root)
    }

    /// Allocate a uniquely named workspace and copy the base files into it.
    pub fn create(&self) -> Result<TestEnvironment> {
        self.verify_source()?;

        let id = format!("test_env_{}", uuid::Uuid::new_v4().simple());
        let path = self.work_root.join(&id);
        fs::create_dir_all(&path)?;

        // From here on the guard owns the directory
        let env = TestEnvironment {
            id,
            path,
            state: EnvState::Created,
        };

        for name in REQUIRED_FILES {
            fs::copy(self.source_root.join(name), env.path.join(name))?;
        }
        let existing_config = self.source_root.join(CONFIG_FILE);
        if existing_config.is_file() {
            fs::copy(&existing_config, env.path.join(CONFIG_FILE))?;
        }
        copy_tree(&self.source_root.join(MODULES_DIR), &env.path.join(MODULES_DIR))?;

        info!(env = %env.id, path = %env.path.display(), "Created test environment");
        Ok(env)
    }

    /// Write the generated configuration into the workspace.
    pub fn stage(&self, env: &mut TestEnvironment, config: &GeneratedConfig) -> Result<()> {
        env.transition(&[EnvState::Created, EnvState::Staged], EnvState::Staged)?;
        fs::write(env.config_path(), config.text())?;
        debug!(env = %env.id, bytes = config.text().len(), "Staged configuration");
        Ok(())
    }

    /// Remove the workspace. Always leaves the environment `Destroyed`.
    pub fn destroy(&self, mut env: TestEnvironment) -> Result<()> {
        let id = env.id.clone();
        env.remove_dir()?;
        debug!(env = %id, "Destroyed test environment");
        Ok(())
    }
}

/// Session-fatal startup check of a base configuration directory.
pub fn verify_base_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(HarnessError::BaseDirMissing(dir.to_path_buf()));
    }

    let mut missing: Vec<String> = REQUIRED_FILES
        .iter()
        .filter(|f| !dir.join(f).is_file())
        .map(|f| f.to_string())
        .collect();
    if !dir.join(MODULES_DIR).is_dir() {
        missing.push(format!("{}/", MODULES_DIR));
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::MissingBaseFiles {
            dir: dir.to_path_buf(),
            missing,
        })
    }
}

/// Copy a directory tree, materializing symlinked files and directories.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| HarnessError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| HarnessError::InvalidState(e.to_string()))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{ConfigGenerator, ConfigurationVariant};
    use crate::test_support::base_dir;
    use tempfile::TempDir;

    fn manager(base: &TempDir, work: &TempDir) -> EnvironmentManager {
        EnvironmentManager::new(base.path(), work.path())
    }

    // ============================================================================
    // verify_base_dir
    // ============================================================================

    #[test]
    fn test_verify_missing_dir() {
        let err = verify_base_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, HarnessError::BaseDirMissing(_)));
        assert!(err.is_session_fatal());
    }

    #[test]
    fn test_verify_reports_every_missing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("flake.nix"), "").unwrap();
        match verify_base_dir(dir.path()).unwrap_err() {
            HarnessError::MissingBaseFiles { missing, .. } => {
                assert_eq!(missing, vec!["flake.lock", "hardware-configuration.nix", "modules/"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    #[test]
    fn test_create_copies_base_files_and_modules() {
        let (base, work) = (base_dir(), TempDir::new().unwrap());
        let env = manager(&base, &work).create().unwrap();
        assert_eq!(env.state(), EnvState::Created);
        for f in REQUIRED_FILES {
            assert!(env.path().join(f).is_file());
        }
        assert!(env.path().join("modules/default.nix").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_create_copies_symlinked_modules() {
        let (base, work) = (base_dir(), TempDir::new().unwrap());
        let shared = TempDir::new().unwrap();
        fs::write(shared.path().join("gpu.nix"), "{ hardware.graphics.enable = true; }\n").unwrap();
        fs::create_dir_all(shared.path().join("audio")).unwrap();
        fs::write(shared.path().join("audio/default.nix"), "{ }\n").unwrap();
        let modules = base.path().join(MODULES_DIR);
        std::os::unix::fs::symlink(shared.path().join("gpu.nix"), modules.join("gpu.nix")).unwrap();
        std::os::unix::fs::symlink(shared.path().join("audio"), modules.join("audio")).unwrap();

        let env = manager(&base, &work).create().unwrap();
        let gpu = env.path().join("modules/gpu.nix");
        assert!(gpu.is_file());
        assert!(!fs::symlink_metadata(&gpu).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(gpu).unwrap(), "{ hardware.graphics.enable = true; }\n");
        assert!(env.path().join("modules/audio/default.nix").is_file());
    }

    #[test]
    fn test_workspace_names_are_unique() {
        let (base, work) = (base_dir(), TempDir::new().unwrap());
        let mgr = manager(&base, &work);
        let a = mgr.create().unwrap();
        let b = mgr.create().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_stage_writes_config_file() {
        let (base, work) = (base_dir(), TempDir::new().unwrap());
        let mgr = manager(&base, &work);
        let mut env = mgr.create().unwrap();
        let cfg = ConfigGenerator::new().generate_config(&ConfigurationVariant::new());
        mgr.stage(&mut env, &cfg).unwrap();
        assert_eq!(env.state(), EnvState::Staged);
        assert_eq!(fs::read_to_string(env.config_path()).unwrap(), cfg.text());
    }

    #[test]
    fn test_destroy_removes_directory() {
        let (base, work) = (base_dir(), TempDir::new().unwrap());
        let mgr = manager(&base, &work);
        let env = mgr.create().unwrap();
        let path = env.path().to_path_buf();
        mgr.destroy(env).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_directory() {
        let (base, work) = (base_dir(), TempDir::new().unwrap());
        let path = {
            let env = manager(&base, &work).create().unwrap();
            env.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_build_requires_validation() {
        let (base, work) = (base_dir(), TempDir::new().unwrap());
        let mgr = manager(&base, &work);
        let mut env = mgr.create().unwrap();
        assert!(env.mark_validated().is_err());
        let cfg = ConfigGenerator::new().generate_config(&ConfigurationVariant::new());
        mgr.stage(&mut env, &cfg).unwrap();
        assert!(env.mark_built().is_err());
        env.mark_validated().unwrap();
        env.mark_built().unwrap();
        assert_eq!(env.state(), EnvState::Built);
    }

    #[test]
    fn test_create_fails_fast_without_base_files() {
        let (base, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        let err = manager(&base, &work).create().unwrap_err();
        assert!(err.is_session_fatal());
        assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    }
}
