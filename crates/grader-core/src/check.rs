use serde::{Deserialize, Serialize};

fn default_min_count() -> usize {
    1
}

/// Declarative behavioral check against a deployed page.
///
/// The wire shape is `{ "type": "...", ...params }`. Check types the engine
/// does not know become [`Check::Unknown`] at deserialization and are skipped
/// with a warning at execution time rather than aborting the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    ElementExists {
        selector: String,
        #[serde(default = "default_min_count")]
        min_count: usize,
    },
    ButtonExists {
        text: Vec<String>,
    },
    ClickInteraction {
        selector: String,
        result: String,
    },
    ResponsiveCheck {
        breakpoints: Vec<u32>,
    },
    #[serde(other)]
    Unknown,
}

impl Check {
    /// Stable name under which this check's result is recorded.
    pub fn result_name(&self) -> String {
        match self {
            Check::ElementExists { selector, .. } => {
                format!("element_{}", truncate(selector, 20))
            }
            Check::ButtonExists { text } => match text.first() {
                Some(t) => format!("button_{}", truncate(t, 20)),
                None => "button_check".to_string(),
            },
            Check::ClickInteraction { .. } => "click_interaction".to_string(),
            Check::ResponsiveCheck { .. } => "responsive_design".to_string(),
            Check::Unknown => "unknown".to_string(),
        }
    }

    /// True for checks that need script execution, input simulation, or
    /// viewport control. Under the static backend these resolve to a fixed
    /// neutral score.
    pub fn needs_interaction(&self) -> bool {
        matches!(
            self,
            Check::ClickInteraction { .. } | Check::ResponsiveCheck { .. }
        )
    }
}

/// Char-safe prefix truncation for result names and stored logs.
pub fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_roundtrip() {
        let check = Check::ElementExists {
            selector: "img".into(),
            min_count: 3,
        };
        let json = serde_json::to_string(&check).unwrap();
        assert!(json.contains("\"type\":\"element_exists\""));
        let back: Check = serde_json::from_str(&json).unwrap();
        assert_eq!(back, check);
    }

    #[test]
    fn min_count_defaults_to_one() {
        let check: Check =
            serde_json::from_str(r#"{"type":"element_exists","selector":".modal"}"#).unwrap();
        assert_eq!(
            check,
            Check::ElementExists {
                selector: ".modal".into(),
                min_count: 1
            }
        );
    }

    #[test]
    fn unknown_type_is_preserved_not_an_error() {
        let check: Check =
            serde_json::from_str(r#"{"type":"keyboard_event","key":"ArrowRight"}"#).unwrap();
        assert_eq!(check, Check::Unknown);
    }

    #[test]
    fn result_names_truncate_long_selectors() {
        let check = Check::ElementExists {
            selector: ".modal, .lightbox, [data-lightbox]".into(),
            min_count: 1,
        };
        assert_eq!(check.result_name(), "element_.modal, .lightbox, [");
    }

    #[test]
    fn interaction_classification() {
        assert!(Check::ClickInteraction {
            selector: "img".into(),
            result: "modal_opens".into()
        }
        .needs_interaction());
        assert!(Check::ResponsiveCheck {
            breakpoints: vec![768]
        }
        .needs_interaction());
        assert!(!Check::ButtonExists { text: vec![] }.needs_interaction());
    }
}
