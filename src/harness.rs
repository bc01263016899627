// src/harness.rs
// Built-in test suite and the sequential session runner

use crate::error::Result;
use crate::generator::{ConfigGenerator, ConfigurationVariant, OptionAxis};
use crate::manager::{ConfigManager, StepOutcome};
use crate::session::{SessionReporter, SessionSummary};
use rand::Rng;
use std::time::Instant;
use tracing::{info, warn};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum TestGroup {
    Base,
    Profile,
    Hardware,
    Random,
    Matrix,
}

impl TestGroup {
    /// Groups run when none are requested. Matrix is opt-in.
    pub fn defaults() -> Vec<TestGroup> {
        vec![TestGroup::Base, TestGroup::Profile, TestGroup::Hardware, TestGroup::Random]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaseBody {
    Config(ConfigurationVariant),
    Skip(String),
}

/// A named configuration to push through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub group: TestGroup,
    pub body: CaseBody,
}

impl TestCase {
    pub fn config(name: impl Into<String>, group: TestGroup, variant: ConfigurationVariant) -> Self {
        Self {
            name: name.into(),
            group,
            body: CaseBody::Config(variant),
        }
    }

    pub fn skip(name: impl Into<String>, group: TestGroup, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group,
            body: CaseBody::Skip(reason.into()),
        }
    }
}

/// Fields shared by the desktop-audio hardware cases
fn desktop_audio(audio: &str) -> ConfigurationVariant {
    ConfigurationVariant::new()
        .with("systemType", "gaming-workstation")
        .with("desktop", "plasma")
        .with("audio", audio)
        .with("mainUser", "testuser")
        .with("hostName", "testhost")
        .with("timeZone", "Europe/Berlin")
        .with("locales", vec!["en_US.UTF-8"])
        .with("keyboardLayout", "de")
        .with("bootloader", "systemd-boot")
        .with("displayManager", "sddm")
        .with("session", "plasmawayland")
}

/// The fixed base, profile and hardware cases
pub fn builtin_cases() -> Vec<TestCase> {
    use TestGroup::*;

    let network_manager = ConfigurationVariant::new()
        .with("enable", true)
        .with("dns", "default")
        .with(
            "wifi",
            ConfigurationVariant::new()
                .with("powersave", false)
                .with("scanRandMacAddress", true),
        );

    vec![
        TestCase::config(
            "basic_config",
            Base,
            ConfigurationVariant::new()
                .with("systemType", "gaming-workstation")
                .with("bootloader", "systemd-boot")
                .with("mainUser", "testuser")
                .with("hostName", "testhost")
                .with("timeZone", "Europe/Berlin")
                .with("locales", vec!["en_US.UTF-8"])
                .with("keyboardLayout", "de")
                .with("desktop", "plasma")
                .with("displayManager", "sddm")
                .with("gpu", "nvidia")
                .with("audio", "pipewire"),
        ),
        TestCase::config(
            "minimal_config",
            Base,
            ConfigurationVariant::new()
                .with("systemType", "headless")
                .with("bootloader", "systemd-boot")
                .with("mainUser", "testuser")
                .with("desktop", "")
                .with("displayManager", None::<&str>),
        ),
        TestCase::config(
            "gaming_profile",
            Profile,
            ConfigurationVariant::new()
                .with("systemType", "gaming")
                .with("desktop", "plasma")
                .with("gpu", "nvidia")
                .with_override("enableSteam", true)
                .with_override("enableGameMode", true)
                .with_override("enableDiscord", true)
                .with_override("enableFirewall", false),
        ),
        TestCase::config(
            "workstation_profile",
            Profile,
            ConfigurationVariant::new()
                .with("systemType", "gaming-workstation")
                .with("desktop", "gnome")
                .with("session", "gnome")
                .with("displayManager", "gdm")
                .with("networkManager", network_manager)
                .with_override("enableDocker", true)
                .with_override("enableVirtualization", true)
                .with_override("enableDevelopmentTools", true)
                .with_override("useAdwaitaTheme", true),
        ),
        TestCase::config(
            "headless_profile",
            Profile,
            ConfigurationVariant::new()
                .with("systemType", "headless")
                .with("desktop", "")
                .with("displayManager", "")
                .with("session", "")
                .with_override("enableSSH", true)
                .with_override("enableFirewall", true)
                .with_override("enableSystemdBootloader", true),
        ),
        TestCase::config(
            "nvidia_config",
            Hardware,
            ConfigurationVariant::new()
                .with("gpu", "nvidia")
                .with_override("enableNvidiaDrivers", true)
                .with_override("enableCuda", true)
                .with_override("enableVulkan", true),
        ),
        TestCase::config(
            "amd_config",
            Hardware,
            ConfigurationVariant::new()
                .with("gpu", "amdgpu")
                .with_override("enableAmdgpu", true)
                .with_override("enableVulkan", true)
                .with_override("enableOpenCL", true),
        ),
        TestCase::config(
            "pipewire_config",
            Hardware,
            desktop_audio("pipewire")
                .with_override("enablePipewire", true)
                .with_override("enableSound", true)
                .with_override("enableBluetooth", true),
        ),
        TestCase::config(
            "pulseaudio_config",
            Hardware,
            desktop_audio("pulseaudio")
                .with_override("enablePulseaudio", true)
                .with_override("enableSound", true)
                .with_override("enableBluetooth", true),
        ),
        TestCase::config(
            "alsa_config",
            Hardware,
            ConfigurationVariant::new()
                .with("systemType", "headless")
                .with("desktop", None::<&str>)
                .with("audio", "alsa")
                .with("mainUser", "testuser")
                .with("hostName", "testhost")
                .with("timeZone", "Europe/Berlin")
                .with("locales", vec!["en_US.UTF-8"])
                .with("keyboardLayout", "de")
                .with("bootloader", "systemd-boot")
                .with("displayManager", None::<&str>)
                .with("session", None::<&str>)
                .with_override("enableAlsa", true)
                .with_override("enableSound", true),
        ),
        TestCase::skip("jack_config", Hardware, "not implemented"),
        TestCase::config(
            "peripheral_config",
            Hardware,
            ConfigurationVariant::new()
                .with_override("enableBluetooth", true)
                .with_override("enablePrinting", true)
                .with_override("enableScanning", true)
                .with_override("enableWebcam", true),
        ),
    ]
}

/// `count` random variants named `random_config_<i>`
pub fn random_cases<R: Rng + ?Sized>(generator: &ConfigGenerator, count: usize, rng: &mut R) -> Vec<TestCase> {
    (0..count)
        .map(|i| {
            TestCase::config(
                format!("random_config_{}", i),
                TestGroup::Random,
                generator.generate_random_variant_with(rng),
            )
        })
        .collect()
}

/// One case per constraint-valid combination over `axes`
pub fn matrix_cases(generator: &ConfigGenerator, axes: &[OptionAxis], max: Option<usize>) -> Vec<TestCase> {
    generator
        .generate_variants(axes, max)
        .into_iter()
        .enumerate()
        .map(|(i, variant)| TestCase::config(format!("matrix_{}", i), TestGroup::Matrix, variant))
        .collect()
}

/// Which cases a session runs
#[derive(Debug, Clone, Default)]
pub struct SuiteOptions {
    /// Empty selects `TestGroup::defaults()`, plus matrix when axes are given
    pub groups: Vec<TestGroup>,
    pub random_tests: usize,
    pub matrix_axes: Vec<OptionAxis>,
    pub max_combinations: Option<usize>,
}

impl SuiteOptions {
    fn selected(&self) -> Vec<TestGroup> {
        if !self.groups.is_empty() {
            return self.groups.clone();
        }
        let mut groups = TestGroup::defaults();
        if !self.matrix_axes.is_empty() {
            groups.push(TestGroup::Matrix);
        }
        groups
    }
}

/// Assemble the session's cases in group order
pub fn build_suite<R: Rng + ?Sized>(generator: &ConfigGenerator, options: &SuiteOptions, rng: &mut R) -> Vec<TestCase> {
    let groups = options.selected();
    let mut cases: Vec<TestCase> = builtin_cases()
        .into_iter()
        .filter(|c| groups.contains(&c.group))
        .collect();
    if groups.contains(&TestGroup::Random) {
        cases.extend(random_cases(generator, options.random_tests, rng));
    }
    if groups.contains(&TestGroup::Matrix) {
        cases.extend(matrix_cases(generator, &options.matrix_axes, options.max_combinations));
    }
    cases
}

/// Runs cases one at a time through a `ConfigManager`.
pub struct HarnessRunner {
    generator: ConfigGenerator,
    manager: ConfigManager,
    reporter: SessionReporter,
    show_progress: bool,
}

impl HarnessRunner {
    pub fn new(generator: ConfigGenerator, manager: ConfigManager, reporter: SessionReporter) -> Self {
        Self {
            generator,
            manager,
            reporter,
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Run every case and summarize. Only an unusable base directory ends the
    /// session early; individual failures are recorded and the run continues.
    pub async fn run(&mut self, cases: &[TestCase]) -> Result<SessionSummary> {
        self.manager.environments().verify_source()?;
        self.reporter.start();
        info!(cases = cases.len(), strategy = %self.manager.strategy(), "Running test session");

        for (i, case) in cases.iter().enumerate() {
            let label = self.run_case(case).await;
            if self.show_progress {
                eprintln!("[{}/{}] {} ... {}", i + 1, cases.len(), case.name, label);
            }
        }
        Ok(self.reporter.finish())
    }

    async fn run_case(&mut self, case: &TestCase) -> &'static str {
        let variant = match &case.body {
            CaseBody::Skip(reason) => {
                self.reporter.record_skipped(&case.name, reason);
                return "SKIP";
            }
            CaseBody::Config(variant) => variant,
        };

        let start = Instant::now();
        self.manager.set_current_test(&case.name);
        let outcome = self.execute(&case.name, variant).await;
        if let Err(e) = self.manager.close_environment() {
            warn!(test = %case.name, error = %e, "Failed to destroy test environment");
        }

        let passed = match outcome {
            Ok(StepOutcome::Failed { message }) => {
                warn!(test = %case.name, error = %message, "Test failed");
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(test = %case.name, error = %e, "Test could not run");
                false
            }
        };
        self.reporter.record_result(&case.name, passed, start.elapsed());
        if passed { "PASS" } else { "FAIL" }
    }

    async fn execute(&mut self, name: &str, variant: &ConfigurationVariant) -> Result<StepOutcome> {
        self.manager.open_environment()?;
        let config = self.generator.generate_config(variant);
        self.manager.apply_config(&config, Some(name))?;

        let validated = self.manager.validate_config().await;
        if !validated.is_success() {
            return Ok(validated);
        }
        Ok(self.manager.build_config().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::constraints;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_unique() {
        let cases = builtin_cases();
        let names: HashSet<_> = cases.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), cases.len());
        assert_eq!(cases.len(), 12);
    }

    #[test]
    fn test_jack_is_skipped() {
        let jack = builtin_cases().into_iter().find(|c| c.name == "jack_config").unwrap();
        assert_eq!(jack.body, CaseBody::Skip("not implemented".into()));
    }

    #[test]
    fn test_builtin_variants_respect_constraints() {
        for case in builtin_cases() {
            if let CaseBody::Config(v) = &case.body {
                assert!(constraints::is_valid_combination(v), "{}", case.name);
            }
        }
    }

    #[test]
    fn test_default_suite_excludes_matrix() {
        let generator = ConfigGenerator::new();
        let opts = SuiteOptions {
            random_tests: 3,
            ..Default::default()
        };
        let cases = build_suite(&generator, &opts, &mut StdRng::seed_from_u64(1));
        assert_eq!(cases.len(), 12 + 3);
        assert!(cases.iter().all(|c| c.group != TestGroup::Matrix));
    }

    #[test]
    fn test_matrix_added_when_axes_given() {
        let generator = ConfigGenerator::new();
        let opts = SuiteOptions {
            groups: vec![TestGroup::Matrix],
            matrix_axes: vec![OptionAxis::SystemType, OptionAxis::Desktop],
            max_combinations: Some(5),
            ..Default::default()
        };
        let cases = build_suite(&generator, &opts, &mut StdRng::seed_from_u64(1));
        assert_eq!(cases.len(), 5);
        assert_eq!(cases[0].name, "matrix_0");
    }

    #[test]
    fn test_seeded_random_cases_reproducible() {
        let generator = ConfigGenerator::new();
        let a = random_cases(&generator, 4, &mut StdRng::seed_from_u64(42));
        let b = random_cases(&generator, 4, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert_eq!(a[3].name, "random_config_3");
    }

    #[test]
    fn test_group_strings() {
        assert_eq!(TestGroup::Hardware.to_string(), "hardware");
        assert_eq!("matrix".parse::<TestGroup>().unwrap(), TestGroup::Matrix);
    }
}
