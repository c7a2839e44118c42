use serde::{Deserialize, Serialize};

pub const FORCE_OVERWRITE_KEYS: &[&str] = &["no", "prompt", "yes"];
pub const PILET_LANGUAGE_KEYS: &[&str] = &["ts", "js"];
pub const TEMPLATE_TYPE_KEYS: &[&str] = &["default", "empty"];
pub const BUILD_TYPE_KEYS: &[&str] = &["all", "release", "develop"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceOverwrite {
    #[default]
    No,
    Prompt,
    Yes,
}

impl ForceOverwrite {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "no" => Some(Self::No),
            "prompt" => Some(Self::Prompt),
            "yes" => Some(Self::Yes),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Prompt => "prompt",
            Self::Yes => "yes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiletLanguage {
    #[default]
    Ts,
    Js,
}

impl PiletLanguage {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ts" => Some(Self::Ts),
            "js" => Some(Self::Js),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::Js => "js",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    #[default]
    Default,
    Empty,
}

impl TemplateType {
    pub fn key(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    #[default]
    All,
    Release,
    Develop,
}

impl BuildType {
    pub fn key(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Release => "release",
            Self::Develop => "develop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_lookups() {
        for key in FORCE_OVERWRITE_KEYS {
            let value = ForceOverwrite::from_key(key).expect("known key");
            assert_eq!(value.key(), *key);
        }
        for key in PILET_LANGUAGE_KEYS {
            let value = PiletLanguage::from_key(key).expect("known key");
            assert_eq!(value.key(), *key);
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert_eq!(ForceOverwrite::from_key("maybe"), None);
        assert_eq!(PiletLanguage::from_key("coffee"), None);
    }

    #[test]
    fn choice_keys_deserialize_into_enums() {
        let template: TemplateType = serde_json::from_str("\"empty\"").expect("template");
        let build: BuildType = serde_json::from_str("\"develop\"").expect("build type");
        let overwrite: ForceOverwrite = serde_json::from_str("\"prompt\"").expect("overwrite");
        assert_eq!(template, TemplateType::Empty);
        assert_eq!(template.key(), "empty");
        assert_eq!(build, BuildType::Develop);
        assert!(BUILD_TYPE_KEYS.contains(&build.key()));
        assert_eq!(overwrite, ForceOverwrite::Prompt);
    }
}
