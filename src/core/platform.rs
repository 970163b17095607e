// ─── Platform Descriptor ───
// Current OS/architecture, the native classifier token derived from it,
// and evaluation of manifest allow/deny rules.

use serde::{Deserialize, Serialize};

use crate::core::version::Library;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl OsFamily {
    /// Name used by `os.name` in version manifests.
    pub fn manifest_name(self) -> &'static str {
        match self {
            OsFamily::Windows => "windows",
            OsFamily::MacOs => "osx",
            OsFamily::Linux => "linux",
            OsFamily::Other => "unknown",
        }
    }

    fn matches_rule(self, name: &str) -> bool {
        match self {
            OsFamily::MacOs => name == "osx" || name == "macos",
            OsFamily::Other => false,
            other => name == other.manifest_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86,
    X86_64,
    Arm,
    Aarch64,
    Other,
}

impl Arch {
    pub fn is_64bit(self) -> bool {
        matches!(self, Arch::X86_64 | Arch::Aarch64)
    }

    fn matches_rule(self, name: &str) -> bool {
        match self {
            Arch::X86 => name == "x86",
            Arch::X86_64 => name == "x86_64" || name == "amd64",
            Arch::Arm => name == "arm" || name == "arm32",
            Arch::Aarch64 => name == "arm64" || name == "aarch64",
            Arch::Other => false,
        }
    }
}

/// Injected description of the machine a launch targets.
///
/// Tests construct arbitrary combinations with [`Platform::new`] instead of
/// depending on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub os: OsFamily,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: OsFamily, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Describe the host this process runs on.
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "windows" => OsFamily::Windows,
            "macos" => OsFamily::MacOs,
            "linux" => OsFamily::Linux,
            _ => OsFamily::Other,
        };
        let arch = match std::env::consts::ARCH {
            "x86" => Arch::X86,
            "x86_64" => Arch::X86_64,
            "arm" => Arch::Arm,
            "aarch64" => Arch::Aarch64,
            _ => Arch::Other,
        };
        Self { os, arch }
    }

    /// Classifier key of the native archive for this platform, if one exists.
    ///
    /// `None` means native extraction is skipped, not that the launch fails.
    pub fn native_classifier(&self) -> Option<&'static str> {
        match (self.os, self.arch) {
            (OsFamily::Windows, Arch::X86_64) => Some("natives-windows"),
            (OsFamily::Windows, Arch::X86) => Some("natives-windows-x86"),
            (OsFamily::Windows, Arch::Aarch64) => Some("natives-windows-arm64"),
            (OsFamily::MacOs, Arch::X86_64) => Some("natives-macos"),
            (OsFamily::MacOs, Arch::Aarch64) => Some("natives-macos-arm64"),
            (OsFamily::Linux, Arch::X86_64) => Some("natives-linux"),
            (OsFamily::Linux, Arch::Aarch64) => Some("natives-linux-arm64"),
            (OsFamily::Linux, Arch::Arm) => Some("natives-linux-arm32"),
            _ => None,
        }
    }

    /// Value substituted for `${arch}` in legacy `natives` maps.
    pub fn arch_bits(&self) -> &'static str {
        if self.arch.is_64bit() {
            "64"
        } else {
            "32"
        }
    }

    pub fn classpath_separator(&self) -> &'static str {
        match self.os {
            OsFamily::Windows => ";",
            _ => ":",
        }
    }

    pub fn java_executable(&self) -> &'static str {
        match self.os {
            OsFamily::Windows => "java.exe",
            _ => "java",
        }
    }

    /// JVM flag the platform needs before anything else, if any.
    ///
    /// GLFW on macOS must own the process main thread.
    pub fn startup_jvm_flag(&self) -> Option<&'static str> {
        match self.os {
            OsFamily::MacOs => Some("-XstartOnFirstThread"),
            _ => None,
        }
    }

    /// Environment variable the dynamic loader searches for shared libraries.
    pub fn library_path_env(&self) -> Option<&'static str> {
        match self.os {
            OsFamily::Windows => Some("PATH"),
            OsFamily::Linux => Some("LD_LIBRARY_PATH"),
            OsFamily::MacOs => Some("DYLD_LIBRARY_PATH"),
            OsFamily::Other => None,
        }
    }

    /// Evaluate an ordered rule list.
    ///
    /// - No rules → allowed.
    /// - Otherwise start disallowed; every rule whose `os` clause matches (or
    ///   that has none) overwrites the outcome, so the last match wins.
    pub fn rules_allow(&self, rules: Option<&[Rule]>) -> bool {
        let Some(rules) = rules else {
            return true;
        };
        if rules.is_empty() {
            return true;
        }

        let mut allowed = false;
        for rule in rules {
            if self.rule_applies(rule) {
                allowed = rule.action == RuleAction::Allow;
            }
        }
        allowed
    }

    pub fn is_library_allowed(&self, library: &Library) -> bool {
        self.rules_allow(library.rules.as_deref())
    }

    fn rule_applies(&self, rule: &Rule) -> bool {
        let Some(os) = &rule.os else {
            return true;
        };
        let name_ok = os.name.as_deref().map_or(true, |n| self.os.matches_rule(n));
        let arch_ok = os.arch.as_deref().map_or(true, |a| self.arch.matches_rule(a));
        name_ok && arch_ok
    }
}

// ─── Rules ───

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    #[serde(alias = "disallow")]
    Deny,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(action: RuleAction, os: Option<&str>) -> Rule {
        Rule {
            action,
            os: os.map(|name| OsRule {
                name: Some(name.to_string()),
                arch: None,
            }),
        }
    }

    const LINUX: Platform = Platform {
        os: OsFamily::Linux,
        arch: Arch::X86_64,
    };
    const MAC_ARM: Platform = Platform {
        os: OsFamily::MacOs,
        arch: Arch::Aarch64,
    };
    const WINDOWS: Platform = Platform {
        os: OsFamily::Windows,
        arch: Arch::X86_64,
    };

    #[test]
    fn no_rules_means_allowed() {
        assert!(LINUX.rules_allow(None));
        assert!(WINDOWS.rules_allow(Some(&[])));
    }

    #[test]
    fn last_matching_rule_wins() {
        let rules = vec![
            rule(RuleAction::Allow, None),
            rule(RuleAction::Deny, Some("windows")),
        ];
        assert!(LINUX.rules_allow(Some(&rules)));
        assert!(MAC_ARM.rules_allow(Some(&rules)));
        assert!(!WINDOWS.rules_allow(Some(&rules)));
    }

    #[test]
    fn allow_only_named_os() {
        let rules = vec![rule(RuleAction::Allow, Some("osx"))];
        assert!(MAC_ARM.rules_allow(Some(&rules)));
        assert!(!LINUX.rules_allow(Some(&rules)));
    }

    #[test]
    fn disallow_is_accepted_as_deny() {
        let parsed: Vec<Rule> = serde_json::from_value(serde_json::json!([
            {"action": "allow"},
            {"action": "disallow", "os": {"name": "osx"}}
        ]))
        .unwrap();
        assert_eq!(parsed[1].action, RuleAction::Deny);
        assert!(!MAC_ARM.rules_allow(Some(&parsed)));
        assert!(WINDOWS.rules_allow(Some(&parsed)));
    }

    #[test]
    fn arch_clause_narrows_a_rule() {
        let rules = vec![Rule {
            action: RuleAction::Allow,
            os: Some(OsRule {
                name: None,
                arch: Some("x86".into()),
            }),
        }];
        let win32 = Platform::new(OsFamily::Windows, Arch::X86);
        assert!(win32.rules_allow(Some(&rules)));
        assert!(!WINDOWS.rules_allow(Some(&rules)));
    }

    #[test]
    fn classifier_distinguishes_mac_architectures() {
        assert_eq!(MAC_ARM.native_classifier(), Some("natives-macos-arm64"));
        assert_eq!(
            Platform::new(OsFamily::MacOs, Arch::X86_64).native_classifier(),
            Some("natives-macos")
        );
        assert_eq!(LINUX.native_classifier(), Some("natives-linux"));
        assert_eq!(
            Platform::new(OsFamily::Other, Arch::X86_64).native_classifier(),
            None
        );
        assert_eq!(
            Platform::new(OsFamily::Linux, Arch::Other).native_classifier(),
            None
        );
    }

    #[test]
    fn platform_specific_launch_details() {
        assert_eq!(WINDOWS.classpath_separator(), ";");
        assert_eq!(LINUX.classpath_separator(), ":");
        assert_eq!(MAC_ARM.startup_jvm_flag(), Some("-XstartOnFirstThread"));
        assert_eq!(LINUX.startup_jvm_flag(), None);
        assert_eq!(WINDOWS.java_executable(), "java.exe");
    }
}
