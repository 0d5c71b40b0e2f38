//! User-facing setup guidance shown when the server tool is unavailable.

use tracing::warn;

pub const INSTALL_GUIDE_URL: &str = "https://github.com/sidecar-dev/reasoning-server#installation";
pub const SYSTEM_REQUIREMENTS_URL: &str =
    "https://github.com/sidecar-dev/reasoning-server#system-requirements";

/// Affordance offered alongside a setup problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidanceAction {
    OpenInstallGuide { url: &'static str },
    OpenSystemRequirements { url: &'static str },
    ShowLogs,
}

impl GuidanceAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenInstallGuide { .. } => "Installation guide",
            Self::OpenSystemRequirements { .. } => "System requirements",
            Self::ShowLogs => "Show logs",
        }
    }

    pub fn url(&self) -> Option<&'static str> {
        match self {
            Self::OpenInstallGuide { url } | Self::OpenSystemRequirements { url } => Some(url),
            Self::ShowLogs => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupGuidance {
    pub message: String,
    pub actions: Vec<GuidanceAction>,
}

impl SetupGuidance {
    /// Guidance for a server tool that is missing or not runnable.
    pub fn tool_missing(reason: &str) -> Self {
        Self {
            message: format!(
                "The reasoning server is not installed or not accessible ({reason}). \
                 Install it and make sure it can be run from this environment."
            ),
            actions: vec![
                GuidanceAction::OpenInstallGuide {
                    url: INSTALL_GUIDE_URL,
                },
                GuidanceAction::OpenSystemRequirements {
                    url: SYSTEM_REQUIREMENTS_URL,
                },
                GuidanceAction::ShowLogs,
            ],
        }
    }
}

/// Presents [`SetupGuidance`] to whoever is driving the supervisor.
pub trait GuidanceNotifier: Send + Sync {
    fn present(&self, guidance: &SetupGuidance);
}

/// Writes guidance to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogGuidanceNotifier;

impl GuidanceNotifier for LogGuidanceNotifier {
    fn present(&self, guidance: &SetupGuidance) {
        warn!("{}", guidance.message);
        for action in &guidance.actions {
            match action.url() {
                Some(url) => warn!("  {}: {url}", action.label()),
                None => warn!("  {}", action.label()),
            }
        }
    }
}
