use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::apps::Apps;
use crate::error::{CommandError, Result};
use crate::schema::ArgSpec;

pub const PIRAL_SUFFIX: &str = "-piral";
pub const PILET_SUFFIX: &str = "-pilet";

/// Operational context a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Piral,
    Pilet,
}

impl Scope {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Piral => PIRAL_SUFFIX,
            Self::Pilet => PILET_SUFFIX,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Piral => "piral",
            Self::Pilet => "pilet",
        }
    }
}

/// Which command table a router resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    All,
    Piral,
    Pilet,
}

impl View {
    pub fn scope(self) -> Option<Scope> {
        match self {
            Self::All => None,
            Self::Piral => Some(Scope::Piral),
            Self::Pilet => Some(Scope::Pilet),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Piral => "piral",
            Self::Pilet => "pilet",
        }
    }
}

impl From<Scope> for View {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Piral => Self::Piral,
            Scope::Pilet => Self::Pilet,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated option values keyed by camel-cased flag name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Deserialize the record into a command's typed argument struct.
    pub fn parse<T: DeserializeOwned>(&self, command: &str) -> Result<T> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|source| {
            CommandError::InvalidOptions {
                command: command.to_string(),
                source,
            }
        })
    }
}

impl FromIterator<(String, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Receives argument specs from a schema.
pub trait SchemaSink {
    fn argument(&mut self, spec: &ArgSpec);
}

/// Something that can populate an argument schema.
pub trait ArgumentSchema: Send + Sync {
    fn populate(&self, sink: &mut dyn SchemaSink);
}

/// Something that can execute with validated options.
pub trait CommandRunner: Send + Sync {
    fn run(&self, apps: &dyn Apps, options: Options) -> anyhow::Result<()>;
}

impl<F> CommandRunner for F
where
    F: Fn(&dyn Apps, Options) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, apps: &dyn Apps, options: Options) -> anyhow::Result<()> {
        self(apps, options)
    }
}

#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: &'static str,
    pub arguments: &'static [&'static str],
    pub scope: Option<Scope>,
    pub flags: Arc<dyn ArgumentSchema>,
    pub run: Arc<dyn CommandRunner>,
}

impl CommandDescriptor {
    /// True when `token` is the name or one of the aliases. Empty tokens never match.
    pub fn answers_to(&self, token: &str) -> bool {
        !token.is_empty()
            && (self.name == token || self.aliases.iter().any(|alias| alias == token))
    }

    pub fn summary(&self) -> CommandSummary {
        CommandSummary {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            description: self.description.to_string(),
            arguments: self.arguments.iter().map(|item| (*item).to_string()).collect(),
            scope: self.scope,
        }
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Serializable listing entry for a command surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandSummary {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub arguments: Vec<String>,
    pub scope: Option<Scope>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apps::Preflight;
    use crate::schema::FlagSet;

    fn descriptor(name: &str, aliases: &[&str]) -> CommandDescriptor {
        CommandDescriptor {
            name: name.to_string(),
            aliases: aliases.iter().map(|alias| (*alias).to_string()).collect(),
            description: "test command",
            arguments: &[],
            scope: None,
            flags: Arc::new(FlagSet::new()),
            run: Arc::new(|_: &dyn Apps, _: Options| -> anyhow::Result<()> { Ok(()) }),
        }
    }

    #[test]
    fn answers_to_name_and_aliases() {
        let command = descriptor("build-pilet", &["bundle-pilet", "build"]);
        assert!(command.answers_to("build-pilet"));
        assert!(command.answers_to("bundle-pilet"));
        assert!(command.answers_to("build"));
        assert!(!command.answers_to("bundle"));
    }

    #[test]
    fn empty_token_never_matches_even_an_empty_name() {
        let command = descriptor("", &[""]);
        assert!(!command.answers_to(""));
    }

    #[test]
    fn options_parse_into_typed_struct() {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Args {
            cache_dir: String,
            port: u16,
            hmr: bool,
        }

        let mut options = Options::new();
        options.insert("cacheDir", ".cache");
        options.insert("port", 1234);
        options.insert("hmr", true);

        let args: Args = options.parse("debug-pilet").expect("parse");
        assert_eq!(args.cache_dir, ".cache");
        assert_eq!(args.port, 1234);
        assert!(args.hmr);
    }

    #[test]
    fn options_parse_reports_command_on_mismatch() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Args {
            port: u16,
        }

        let mut options = Options::new();
        options.insert("port", "not a number");
        let error = options.parse::<Args>("debug-piral").expect_err("must fail");
        assert!(error.to_string().contains("debug-piral"));
    }

    #[test]
    fn closures_act_as_runners() {
        let command = descriptor("validate-pilet", &[]);
        command
            .run
            .run(&Preflight::default(), Options::new())
            .expect("run");
    }
}
