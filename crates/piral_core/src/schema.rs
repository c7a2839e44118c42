use std::ffi::OsString;
use std::path::Path;

use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use heck::ToLowerCamelCase;
use serde_json::Value;

use crate::command::{ArgumentSchema, CommandDescriptor, Options, SchemaSink};
use crate::error::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    String,
    Number,
    Boolean,
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    Text(String),
    Number(i64),
    Flag(bool),
    /// Resolved to the process working directory at parse time.
    WorkingDir,
}

impl DefaultValue {
    fn resolve(&self, working_dir: &Path) -> Value {
        match self {
            Self::Text(text) => Value::from(text.clone()),
            Self::Number(number) => Value::from(*number),
            Self::Flag(flag) => Value::from(*flag),
            Self::WorkingDir => Value::from(working_dir.to_string_lossy().into_owned()),
        }
    }

    fn display(&self) -> String {
        match self {
            Self::Text(text) => format!("{text:?}"),
            Self::Number(number) => number.to_string(),
            Self::Flag(flag) => flag.to_string(),
            Self::WorkingDir => "current directory".to_string(),
        }
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for DefaultValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u16> for DefaultValue {
    fn from(value: u16) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u8> for DefaultValue {
    fn from(value: u8) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kind: ArgKind,
    pub positional: bool,
    pub describe: &'static str,
    pub default: Option<DefaultValue>,
    pub required: bool,
}

impl ArgSpec {
    /// Key under which the value appears in the options record.
    pub fn key(&self) -> String {
        self.name.to_lower_camel_case()
    }

    fn help(&self) -> String {
        match &self.default {
            Some(default) => format!("{} [default: {}]", self.describe, default.display()),
            None => self.describe.to_string(),
        }
    }
}

/// Ordered list of argument specs, built in a chained style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    specs: Vec<ArgSpec>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(self, name: &'static str, describe: &'static str) -> Self {
        self.push(name, ArgKind::String, true, describe)
    }

    pub fn string(self, name: &'static str, describe: &'static str) -> Self {
        self.push(name, ArgKind::String, false, describe)
    }

    pub fn number(self, name: &'static str, describe: &'static str) -> Self {
        self.push(name, ArgKind::Number, false, describe)
    }

    pub fn boolean(self, name: &'static str, describe: &'static str) -> Self {
        self.push(name, ArgKind::Boolean, false, describe)
    }

    pub fn choices(
        self,
        name: &'static str,
        values: &'static [&'static str],
        describe: &'static str,
    ) -> Self {
        self.push(name, ArgKind::Choice(values), false, describe)
    }

    /// Sets the default of the most recently added argument.
    pub fn with_default(mut self, value: impl Into<DefaultValue>) -> Self {
        if let Some(spec) = self.specs.last_mut() {
            spec.default = Some(value.into());
        }
        self
    }

    /// Like [`FlagSet::with_default`], but leaves the argument without a default for `None`.
    pub fn with_optional_default<V: Into<DefaultValue>>(self, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_default(value),
            None => self,
        }
    }

    /// Marks the most recently added argument as required.
    pub fn required(mut self) -> Self {
        if let Some(spec) = self.specs.last_mut() {
            spec.required = true;
        }
        self
    }

    /// Adds the `--base` flag every command shares.
    pub fn base(self) -> Self {
        self.string(
            "base",
            "Sets the base directory. By default the current directory is used.",
        )
        .with_default(DefaultValue::WorkingDir)
    }

    pub fn specs(&self) -> &[ArgSpec] {
        &self.specs
    }

    fn push(
        mut self,
        name: &'static str,
        kind: ArgKind,
        positional: bool,
        describe: &'static str,
    ) -> Self {
        self.specs.push(ArgSpec {
            name,
            kind,
            positional,
            describe,
            default: None,
            required: false,
        });
        self
    }
}

impl ArgumentSchema for FlagSet {
    fn populate(&self, sink: &mut dyn SchemaSink) {
        for spec in &self.specs {
            sink.argument(spec);
        }
    }
}

#[derive(Default)]
struct SpecCollector(Vec<ArgSpec>);

impl SchemaSink for SpecCollector {
    fn argument(&mut self, spec: &ArgSpec) {
        self.0.push(spec.clone());
    }
}

/// clap back end for a single descriptor's argument schema.
#[derive(Debug, Clone)]
pub struct CommandParser {
    name: String,
    command: Command,
    specs: Vec<ArgSpec>,
}

impl CommandParser {
    pub fn for_descriptor(descriptor: &CommandDescriptor) -> Self {
        let mut collector = SpecCollector::default();
        descriptor.flags.populate(&mut collector);
        let specs = collector.0;

        let mut command = Command::new(descriptor.name.clone()).about(descriptor.description);
        if !descriptor.aliases.is_empty() {
            command = command.visible_aliases(descriptor.aliases.clone());
        }
        let command = command.args(specs.iter().map(clap_arg));

        Self {
            name: descriptor.name.clone(),
            command,
            specs,
        }
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn specs(&self) -> &[ArgSpec] {
        &self.specs
    }

    /// Parses `args` (without the command token) into an options record.
    ///
    /// Usage problems surface as `clap::Error`, schema problems as
    /// [`CommandError`]; both travel inside the returned `anyhow::Error`.
    pub fn parse<I, T>(&self, args: I, working_dir: &Path) -> Result<Options>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let argv = std::iter::once(OsString::from(&self.name)).chain(self.normalize_booleans(args));
        let matches = self.command.clone().try_get_matches_from(argv)?;
        Ok(self.collect(&matches, working_dir)?)
    }

    /// Rewrites `--flag true|false` and `--no-flag` into `--flag=<value>`.
    ///
    /// A following token is only taken when it is literally `true` or
    /// `false`; anything else stays a separate argument.
    fn normalize_booleans(&self, args: Vec<OsString>) -> Vec<OsString> {
        let mut normalized = Vec::with_capacity(args.len());
        let mut args = args.into_iter().peekable();
        while let Some(arg) = args.next() {
            let Some(flag) = arg
                .to_str()
                .and_then(|text| text.strip_prefix("--"))
                .map(str::to_string)
            else {
                normalized.push(arg);
                continue;
            };
            if flag.is_empty() {
                normalized.push(arg);
                normalized.extend(args);
                break;
            }
            if self.is_boolean(&flag) {
                let value = args
                    .next_if(|next| matches!(next.to_str(), Some("true" | "false")))
                    .and_then(|next| next.into_string().ok());
                normalized.push(match value {
                    Some(value) => OsString::from(format!("--{flag}={value}")),
                    None => arg,
                });
                continue;
            }
            match flag.strip_prefix("no-") {
                Some(negated) if self.is_boolean(negated) => {
                    normalized.push(OsString::from(format!("--{negated}=false")));
                }
                _ => normalized.push(arg),
            }
        }
        normalized
    }

    fn is_boolean(&self, flag: &str) -> bool {
        self.specs
            .iter()
            .any(|spec| spec.kind == ArgKind::Boolean && !spec.positional && spec.name == flag)
    }

    fn collect(
        &self,
        matches: &ArgMatches,
        working_dir: &Path,
    ) -> std::result::Result<Options, CommandError> {
        let mut options = Options::new();
        for spec in &self.specs {
            let value = match spec.kind {
                ArgKind::String | ArgKind::Choice(_) => matches
                    .get_one::<String>(spec.name)
                    .map(|value| Value::from(value.clone())),
                ArgKind::Number => matches.get_one::<i64>(spec.name).map(|value| Value::from(*value)),
                ArgKind::Boolean => matches
                    .get_one::<bool>(spec.name)
                    .map(|value| Value::from(*value)),
            };

            let value = match value {
                Some(value) => value,
                None => match &spec.default {
                    Some(default) => {
                        let resolved = default.resolve(working_dir);
                        check_choice(spec, &resolved)?;
                        resolved
                    }
                    None if spec.required => {
                        return Err(CommandError::MissingOption {
                            command: self.name.clone(),
                            flag: spec.name.to_string(),
                        });
                    }
                    None => continue,
                },
            };
            options.insert(spec.key(), value);
        }
        Ok(options)
    }
}

fn check_choice(spec: &ArgSpec, value: &Value) -> std::result::Result<(), CommandError> {
    let ArgKind::Choice(values) = spec.kind else {
        return Ok(());
    };
    match value.as_str() {
        Some(text) if values.contains(&text) => Ok(()),
        _ => Err(CommandError::InvalidChoice {
            flag: spec.name.to_string(),
            value: value.as_str().map_or_else(|| value.to_string(), str::to_string),
            expected: values.join(", "),
        }),
    }
}

fn clap_arg(spec: &ArgSpec) -> Arg {
    let mut arg = Arg::new(spec.name)
        .help(spec.help())
        .required(spec.required && spec.default.is_none());
    if !spec.positional {
        arg = arg.long(spec.name);
    }
    match spec.kind {
        ArgKind::String => arg.action(ArgAction::Set).value_parser(value_parser!(String)),
        ArgKind::Number => arg.action(ArgAction::Set).value_parser(value_parser!(i64)),
        ArgKind::Boolean => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_parser(value_parser!(bool)),
        ArgKind::Choice(values) => arg
            .action(ArgAction::Set)
            .value_parser(PossibleValuesParser::new(values.iter().copied())),
    }
}
