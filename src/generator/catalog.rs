// src/generator/catalog.rs
// Option catalog, base configuration, profile and desktop default bundles

use super::value::{ConfigValue, ConfigurationVariant};
use std::collections::BTreeMap;

/// A dimension of the option space. The string form is the config key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::IntoStaticStr,
    strum::EnumString,
    strum::EnumIter,
    strum::Display,
)]
pub enum OptionAxis {
    #[strum(serialize = "systemType")]
    SystemType,
    #[strum(serialize = "bootloader")]
    Bootloader,
    #[strum(serialize = "allowUnfree")]
    AllowUnfree,
    #[strum(serialize = "desktop")]
    Desktop,
    #[strum(serialize = "displayManager")]
    DisplayManager,
    #[strum(serialize = "session")]
    Session,
    #[strum(serialize = "darkMode")]
    DarkMode,
    #[strum(serialize = "gpu")]
    Gpu,
    #[strum(serialize = "audio")]
    Audio,
    #[strum(serialize = "enableFirewall")]
    EnableFirewall,
    #[strum(serialize = "timeZone")]
    TimeZone,
    #[strum(serialize = "locales")]
    Locales,
    #[strum(serialize = "keyboardLayout")]
    KeyboardLayout,
    #[strum(serialize = "keyboardOptions")]
    KeyboardOptions,
}

impl OptionAxis {
    /// Config key this axis assigns
    pub fn key(&self) -> &'static str {
        self.into()
    }

    /// All catalog values for this axis, in catalog order.
    pub fn values(&self) -> Vec<ConfigValue> {
        fn strs(items: &[&str]) -> Vec<ConfigValue> {
            items.iter().map(|s| ConfigValue::from(*s)).collect()
        }
        fn opt_strs(items: &[Option<&str>]) -> Vec<ConfigValue> {
            items.iter().map(|s| ConfigValue::from(*s)).collect()
        }
        let bools = || vec![ConfigValue::Bool(true), ConfigValue::Bool(false)];

        match self {
            OptionAxis::SystemType => strs(&["gaming", "gaming-workstation", "headless", "workstation"]),
            OptionAxis::Bootloader => strs(&["systemd-boot", "grub", "refind"]),
            OptionAxis::AllowUnfree => bools(),
            OptionAxis::Desktop => opt_strs(&[Some("plasma"), Some("gnome"), Some("xfce"), None]),
            OptionAxis::DisplayManager => opt_strs(&[Some("sddm"), Some("gdm"), Some("lightdm"), None]),
            OptionAxis::Session => opt_strs(&[
                Some("plasmawayland"),
                Some("plasmax11"),
                Some("gnomewayland"),
                Some("gnomex11"),
                Some("xfce"),
                Some("i3"),
                None,
            ]),
            OptionAxis::DarkMode => bools(),
            OptionAxis::Gpu => strs(&["nvidia", "nvidiaIntelPrime", "intel", "amdgpu"]),
            OptionAxis::Audio => strs(&["pipewire", "pulseaudio", "alsa"]),
            OptionAxis::EnableFirewall => bools(),
            OptionAxis::TimeZone => strs(&["Europe/Berlin", "Europe/London", "America/New_York", "Asia/Tokyo"]),
            OptionAxis::Locales => ["en_US.UTF-8", "de_DE.UTF-8", "fr_FR.UTF-8", "es_ES.UTF-8"]
                .iter()
                .map(|l| ConfigValue::List(vec![l.to_string()]))
                .collect(),
            OptionAxis::KeyboardLayout => strs(&["de", "us", "fr", "es"]),
            OptionAxis::KeyboardOptions => strs(&["eurosign:e", "caps:escape", "grp:alt_shift_toggle"]),
        }
    }

    /// Axes used when a caller asks for variants without naming any.
    pub fn default_axes() -> Vec<OptionAxis> {
        vec![OptionAxis::SystemType, OptionAxis::Desktop, OptionAxis::Audio]
    }
}

/// Feature flags the random generator toggles.
pub const OVERRIDE_FLAGS: [&str; 12] = [
    "enableSSH",
    "enableSteam",
    "enableGameMode",
    "enableDiscord",
    "enableDocker",
    "enableVirtualization",
    "enableDevelopmentTools",
    "enableSystemdBootloader",
    "enableFirewall",
    "enableBluetooth",
    "enablePrinting",
    "enableWebcam",
];

/// User created by every generated configuration.
pub const MAIN_USER: &str = "testuser";

/// Host name the base flake exposes under `nixosConfigurations`.
pub const DEFAULT_HOST: &str = "testhost";

fn map(entries: Vec<(&str, ConfigValue)>) -> ConfigValue {
    ConfigValue::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn flags(entries: &[&str]) -> ConfigValue {
    map(entries.iter().map(|f| (*f, ConfigValue::Bool(true))).collect())
}

/// Defaults every generated configuration starts from.
pub fn base_config() -> ConfigurationVariant {
    ConfigurationVariant::new()
        .with("systemType", "gaming-workstation")
        .with("bootloader", "systemd-boot")
        .with("allowUnfree", true)
        .with(
            "users",
            map(vec![(
                MAIN_USER,
                map(vec![
                    ("role", "admin".into()),
                    ("defaultShell", "zsh".into()),
                    ("autoLogin", false.into()),
                ]),
            )]),
        )
        .with("hostName", DEFAULT_HOST)
        .with("timeZone", "Europe/Berlin")
        .with("locales", vec!["en_US.UTF-8"])
        .with("keyboardLayout", "de")
        .with("keyboardOptions", "eurosign:e")
        .with("desktop", "plasma")
        .with("displayManager", "sddm")
        .with("session", "plasmawayland")
        .with("darkMode", false)
        .with("gpu", "amdgpu")
        .with("audio", "pipewire")
        .with(
            "sudo",
            map(vec![("requirePassword", true.into()), ("timeout", 15i64.into())]),
        )
        .with("enableFirewall", true)
        .with("testing", true)
}

/// Profile defaults keyed by `systemType`.
pub fn profile_defaults(system_type: &str) -> Option<ConfigurationVariant> {
    let profile = match system_type {
        "gaming" => ConfigurationVariant::new()
            .with("desktop", "plasma")
            .with("allowUnfree", true)
            .with("overrides", flags(&["enableSteam", "enableGameMode", "enableDiscord"])),
        "headless" => ConfigurationVariant::new()
            .with("desktop", ConfigValue::Null)
            .with("displayManager", ConfigValue::Null)
            .with("session", ConfigValue::Null)
            .with("overrides", flags(&["enableSSH", "enableFirewall"])),
        "gaming-workstation" => ConfigurationVariant::new()
            .with("desktop", "plasma")
            .with("allowUnfree", true)
            .with(
                "overrides",
                flags(&["enableDocker", "enableVirtualization", "enableDevelopmentTools"]),
            ),
        "workstation" => ConfigurationVariant::new()
            .with("desktop", "gnome")
            .with("allowUnfree", true)
            .with("overrides", flags(&["enableDevelopmentTools", "enableDocker"])),
        _ => return None,
    };
    Some(profile)
}

/// Desktop-specific defaults keyed by `desktop`.
pub fn desktop_defaults(desktop: &str) -> Option<ConfigurationVariant> {
    let defaults = match desktop {
        "gnome" => ConfigurationVariant::new()
            .with("darkMode", true)
            .with("session", "gnomewayland")
            .with("displayManager", "gdm"),
        "plasma" => ConfigurationVariant::new()
            .with("session", "plasmawayland")
            .with("displayManager", "sddm"),
        "xfce" => ConfigurationVariant::new()
            .with("session", "xfce")
            .with("displayManager", "lightdm")
            .with("darkMode", false),
        _ => return None,
    };
    Some(defaults)
}

/// Catalog values as a lookup table, mostly for listing in the CLI.
pub fn catalog() -> BTreeMap<&'static str, Vec<ConfigValue>> {
    use strum::IntoEnumIterator;
    OptionAxis::iter().map(|a| (a.key(), a.values())).collect()
}
