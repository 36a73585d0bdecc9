// Lifecycle settings scaffolding
//
// Per-content-type settings for the auto-redirect-on-rename feature. The
// feature itself is not wired up; this module only carries the setting shape,
// upsert semantics and the URL template helper so a host can persist operator
// choices. Held as an explicitly injected value rather than a process-wide
// singleton, keeping the validation core testable in isolation.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Auto-redirect configuration for one content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleSetting {
    /// Content-type identifier the setting applies to.
    pub uid: String,
    /// Whether redirects are generated when the tracked field changes.
    #[serde(default)]
    pub enabled: bool,
    /// Name of the tracked URL field.
    #[serde(default)]
    pub field: String,
}

/// Partial update applied to a setting; unset fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingUpdate {
    pub enabled: Option<bool>,
    pub field: Option<String>,
}

/// Injected container for lifecycle settings.
#[derive(Debug, Default)]
pub struct LifecycleSettings {
    inner: RwLock<Vec<LifecycleSetting>>,
}

impl LifecycleSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all settings.
    pub fn list(&self) -> Vec<LifecycleSetting> {
        self.inner.read().clone()
    }

    /// Update the setting for `uid`, creating a disabled default entry first
    /// if none exists. Returns the resulting full list.
    pub fn update(&self, uid: &str, changes: SettingUpdate) -> Vec<LifecycleSetting> {
        let mut settings = self.inner.write();

        let index = match settings.iter().position(|s| s.uid == uid) {
            Some(existing) => existing,
            None => {
                settings.push(LifecycleSetting {
                    uid: uid.to_string(),
                    enabled: false,
                    field: String::new(),
                });
                settings.len() - 1
            }
        };
        let entry = &mut settings[index];

        if let Some(enabled) = changes.enabled {
            entry.enabled = enabled;
        }
        if let Some(field) = changes.field {
            entry.field = field;
        }

        settings.clone()
    }
}

/// Expand a redirect URL template, substituting the `[field]` and `[locale]`
/// placeholders.
pub fn format_url(template: &str, field_value: &str, locale: &str) -> String {
    template
        .replace("[field]", field_value)
        .replace("[locale]", locale)
}
