/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Runtime preferences for paint ordering and hit testing.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Preferences consulted when building paint order and hit testing. They are
/// carried by each [`crate::LayoutSnapshot`] rather than read from global
/// state, so that snapshots taken under different preferences can coexist.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct LayoutPrefs {
    /// Whether CSS Regions are honored. When disabled, region boxes behave as
    /// ordinary boxes and flowed elements are painted where they are.
    #[serde(rename = "layout.regions.enabled")]
    pub regions_enabled: bool,

    /// Whether boxes with `pointer-events: none` are skipped when hit testing.
    #[serde(rename = "layout.hit_test.honor_pointer_events")]
    pub honor_pointer_events: bool,
}

impl Default for LayoutPrefs {
    fn default() -> Self {
        Self {
            regions_enabled: true,
            honor_pointer_events: true,
        }
    }
}

impl LayoutPrefs {
    /// Read preferences from a JSON prefs document. Missing keys keep their
    /// default value and unknown keys are ignored.
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(json).map_err(|error| LayoutError::InvalidPrefs(error.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = LayoutPrefs::default();
        assert!(prefs.regions_enabled);
        assert!(prefs.honor_pointer_events);
        assert_eq!(LayoutPrefs::from_json_str("{}").unwrap(), prefs);
    }

    #[test]
    fn test_partial_document() {
        let prefs = LayoutPrefs::from_json_str(
            r#"{ "layout.regions.enabled": false, "dom.webgpu.enabled": true }"#,
        )
        .unwrap();
        assert!(!prefs.regions_enabled);
        assert!(prefs.honor_pointer_events);
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            LayoutPrefs::from_json_str(r#"{ "layout.regions.enabled": "yes" }"#),
            Err(LayoutError::InvalidPrefs(_))
        ));
    }
}
