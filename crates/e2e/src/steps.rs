//! Browser step model
//!
//! Page objects emit [`UiStep`]s; a [`Journey`] is a named sequence of them
//! that the Playwright driver runs in one browser session.

use serde::{Deserialize, Serialize};

/// A named, tagged sequence of browser steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    /// Unique name for this journey
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps to execute in order
    pub steps: Vec<UiStep>,
}

impl Journey {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn tagged(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Append a batch of steps, typically from a page object
    pub fn then(mut self, steps: impl IntoIterator<Item = UiStep>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A single browser step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiStep {
    /// Navigate to an absolute URL
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Click an element
    Click {
        selector: String,
    },

    /// Fill an input field
    Fill {
        selector: String,
        value: String,
    },

    /// Press a key, optionally on an element
    Press {
        selector: Option<String>,
        key: String,
    },

    /// Wait for an element to reach a state
    Wait {
        selector: String,
        #[serde(default)]
        state: WaitState,
    },

    /// Assert something about an element
    Assert {
        selector: String,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        count: Option<usize>,
    },

    /// Assert the page URL contains a fragment
    AssertUrl {
        contains: String,
    },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },

    /// Log a message (for debugging)
    Log {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

impl UiStep {
    pub fn navigate(url: impl Into<String>) -> Self {
        UiStep::Navigate {
            url: url.into(),
            wait_for_selector: None,
        }
    }

    pub fn click(selector: &str) -> Self {
        UiStep::Click {
            selector: selector.to_string(),
        }
    }

    pub fn fill(selector: &str, value: &str) -> Self {
        UiStep::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        }
    }

    pub fn wait(selector: &str) -> Self {
        UiStep::Wait {
            selector: selector.to_string(),
            state: WaitState::Visible,
        }
    }

    pub fn expect_visible(selector: &str) -> Self {
        UiStep::Assert {
            selector: selector.to_string(),
            visible: Some(true),
            text: None,
            text_contains: None,
            count: None,
        }
    }

    pub fn expect_hidden(selector: &str) -> Self {
        UiStep::Assert {
            selector: selector.to_string(),
            visible: Some(false),
            text: None,
            text_contains: None,
            count: None,
        }
    }

    pub fn expect_text(selector: &str, text: &str) -> Self {
        UiStep::Assert {
            selector: selector.to_string(),
            visible: None,
            text: Some(text.to_string()),
            text_contains: None,
            count: None,
        }
    }

    pub fn expect_text_contains(selector: &str, text: &str) -> Self {
        UiStep::Assert {
            selector: selector.to_string(),
            visible: None,
            text: None,
            text_contains: Some(text.to_string()),
            count: None,
        }
    }

    pub fn expect_count(selector: &str, count: usize) -> Self {
        UiStep::Assert {
            selector: selector.to_string(),
            visible: None,
            text: None,
            text_contains: None,
            count: Some(count),
        }
    }

    /// Short label used in logs and results
    pub fn name(&self) -> String {
        match self {
            UiStep::Navigate { url, .. } => format!("navigate:{}", url),
            UiStep::Click { selector } => format!("click:{}", selector),
            UiStep::Fill { selector, .. } => format!("fill:{}", selector),
            UiStep::Press { key, .. } => format!("press:{}", key),
            UiStep::Wait { selector, .. } => format!("wait:{}", selector),
            UiStep::Assert { selector, .. } => format!("assert:{}", selector),
            UiStep::AssertUrl { contains } => format!("assert-url:{}", contains),
            UiStep::Screenshot { name, .. } => format!("screenshot:{}", name),
            UiStep::Log { message } => format!("log:{}", message.chars().take(30).collect::<String>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_wire_format() {
        let step = UiStep::fill("[data-test=\"username\"]", "standard_user");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "fill");
        assert_eq!(json["value"], "standard_user");

        let parsed: UiStep =
            serde_json::from_str(r##"{"action": "wait", "selector": "#inventory_container"}"##).unwrap();
        assert_eq!(parsed, UiStep::wait("#inventory_container"));
    }

    #[test]
    fn test_journey_builder() {
        let journey = Journey::new("login", "Standard user logs in")
            .tagged("smoke")
            .then([UiStep::navigate("https://www.saucedemo.com/")])
            .then(vec![UiStep::click("[data-test=\"login-button\"]")]);
        assert!(journey.has_tag("smoke"));
        assert!(!journey.has_tag("cart"));
        assert_eq!(journey.steps.len(), 2);
        assert_eq!(journey.steps[1].name(), "click:[data-test=\"login-button\"]");
    }

    #[test]
    fn test_log_name_is_truncated_on_char_boundary() {
        let step = UiStep::Log {
            message: "größere Menge ".repeat(5),
        };
        assert_eq!(step.name().chars().count(), "log:".len() + 30);
    }
}
