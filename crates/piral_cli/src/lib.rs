use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Command, CommandFactory, FromArgMatches, Parser, Subcommand};
use piral_core::config::{config_path, load_config};
use piral_core::{AppDefaults, Apps, CommandRegistry, Preflight, Router, View};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "PIRAL_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    #[arg(long, value_name = "PATH", help = "Config file to read instead of .piral/config.toml")]
    config: Option<PathBuf>,
    #[arg(long, short, help = "Log debug output to stderr")]
    verbose: bool,
    #[arg(long, help = "Print the available commands as JSON")]
    commands_json: bool,
    #[command(subcommand)]
    command: Option<External>,
}

#[derive(Debug, Subcommand)]
enum External {
    #[command(external_subcommand)]
    Run(Vec<OsString>),
}

/// Top-level options that precede the command token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub commands_json: bool,
    pub command: Option<(String, Vec<OsString>)>,
}

impl Invocation {
    pub fn parse_from<I, T>(view: View, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = build_cli(view, CommandRegistry::builtin()).try_get_matches_from(args)?;
        let cli = Cli::from_arg_matches(&matches)?;
        Ok(Self::from_cli(cli))
    }

    fn from_cli(cli: Cli) -> Self {
        let command = cli.command.and_then(|External::Run(argv)| {
            let mut argv = argv.into_iter();
            let token = argv.next()?.to_string_lossy().into_owned();
            Some((token, argv.collect()))
        });
        Self {
            config: cli.config,
            verbose: cli.verbose,
            commands_json: cli.commands_json,
            command,
        }
    }
}

pub fn bin_name(view: View) -> &'static str {
    match view {
        View::All => "pb",
        View::Piral => "piral",
        View::Pilet => "pilet",
    }
}

pub fn build_cli(view: View, registry: &CommandRegistry) -> Command {
    Cli::command()
        .name(bin_name(view))
        .about(match view {
            View::All => "Piral CLI: debug, build and publish Piral instances and pilets",
            View::Piral => "Piral CLI for Piral instances",
            View::Pilet => "Piral CLI for pilets",
        })
        .after_help(command_listing(registry, view))
}

fn command_listing(registry: &CommandRegistry, view: View) -> String {
    let commands = registry.view(view);
    let width = commands
        .iter()
        .map(|command| command.name.len())
        .max()
        .unwrap_or(0);
    let mut listing = String::from("Commands:\n");
    for command in commands.iter() {
        listing.push_str(&format!(
            "  {:width$}  {}",
            command.name, command.description
        ));
        if !command.aliases.is_empty() {
            listing.push_str(&format!(" [aliases: {}]", command.aliases.join(", ")));
        }
        listing.push('\n');
    }
    listing.push_str(&format!(
        "\nRun `{} <command> --help` for the options of a command.",
        bin_name(view)
    ));
    listing
}

pub fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize tracing subscriber: {error}"))
}

/// Config-adjusted registry for the given working directory.
pub fn load_registry(cwd: &Path, explicit_config: Option<&Path>) -> Result<CommandRegistry> {
    let path = config_path(cwd, explicit_config);
    let config = load_config(&path)?;
    let defaults = config
        .apply(AppDefaults::default())
        .with_context(|| format!("invalid defaults in {}", path.display()))?;
    tracing::debug!(config = %path.display(), "loaded command defaults");
    Ok(CommandRegistry::new(&defaults))
}

pub fn render_surface(registry: &CommandRegistry, view: View) -> Result<String> {
    Ok(serde_json::to_string_pretty(&registry.surface(view))?)
}

pub fn execute(view: View, invocation: &Invocation, cwd: &Path, apps: &dyn Apps) -> Result<()> {
    let registry = load_registry(cwd, invocation.config.as_deref())?;

    if invocation.commands_json {
        println!("{}", render_surface(&registry, view)?);
        return Ok(());
    }

    let Some((token, args)) = &invocation.command else {
        build_cli(view, &registry).print_help()?;
        println!();
        return Ok(());
    };

    let commands = registry.view(view);
    Router::new(view, &commands, apps).dispatch(token, args.iter().cloned(), cwd)
}

pub fn run(view: View) -> Result<()> {
    dotenvy::dotenv().ok();
    let invocation = Invocation::parse_from(view, env::args_os())?;
    init_tracing(invocation.verbose)?;

    let cwd = env::current_dir().context("failed to resolve current directory")?;
    execute(view, &invocation, &cwd, &Preflight)
}

/// Entry point shared by the binaries.
pub fn main_for(view: View) -> ExitCode {
    match run(view) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => match error.downcast::<clap::Error>() {
            Ok(usage) => usage.exit(),
            Err(error) => {
                eprintln!("Error: {error:?}");
                ExitCode::FAILURE
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Mutex;

    use piral_core::apps::{
        BuildPiletOptions, BuildPiralOptions, DebugPiletOptions, DebugPiralOptions,
        NewPiletOptions, NewPiralOptions, PackPiletOptions, PublishPiletOptions,
        UpgradePiletOptions, ValidatePiletOptions, ValidatePiralOptions,
    };
    use piral_core::{CommandError, CommandSummary};
    use serde::Serialize;
    use serde_json::Value;
    use tempfile::tempdir;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, PathBuf, Value)>>,
    }

    impl Recorder {
        fn record<T: Serialize>(&self, operation: &str, base_dir: &Path, options: &T) -> Result<()> {
            let options = serde_json::to_value(options)?;
            self.calls
                .lock()
                .map_err(|_| anyhow!("recorder poisoned"))?
                .push((operation.to_string(), base_dir.to_path_buf(), options));
            Ok(())
        }

        fn calls(&self) -> Vec<(String, PathBuf, Value)> {
            self.calls.lock().expect("lock").clone()
        }
    }

    impl Apps for Recorder {
        fn debug_piral(&self, base_dir: &Path, options: DebugPiralOptions) -> Result<()> {
            self.record("debug-piral", base_dir, &options)
        }
        fn build_piral(&self, base_dir: &Path, options: BuildPiralOptions) -> Result<()> {
            self.record("build-piral", base_dir, &options)
        }
        fn new_piral(&self, base_dir: &Path, options: NewPiralOptions) -> Result<()> {
            self.record("new-piral", base_dir, &options)
        }
        fn validate_piral(&self, base_dir: &Path, options: ValidatePiralOptions) -> Result<()> {
            self.record("validate-piral", base_dir, &options)
        }
        fn debug_pilet(&self, base_dir: &Path, options: DebugPiletOptions) -> Result<()> {
            self.record("debug-pilet", base_dir, &options)
        }
        fn build_pilet(&self, base_dir: &Path, options: BuildPiletOptions) -> Result<()> {
            self.record("build-pilet", base_dir, &options)
        }
        fn pack_pilet(&self, base_dir: &Path, options: PackPiletOptions) -> Result<()> {
            self.record("pack-pilet", base_dir, &options)
        }
        fn publish_pilet(&self, base_dir: &Path, options: PublishPiletOptions) -> Result<()> {
            self.record("publish-pilet", base_dir, &options)
        }
        fn new_pilet(&self, base_dir: &Path, options: NewPiletOptions) -> Result<()> {
            self.record("new-pilet", base_dir, &options)
        }
        fn upgrade_pilet(&self, base_dir: &Path, options: UpgradePiletOptions) -> Result<()> {
            self.record("upgrade-pilet", base_dir, &options)
        }
        fn validate_pilet(&self, base_dir: &Path, options: ValidatePiletOptions) -> Result<()> {
            self.record("validate-pilet", base_dir, &options)
        }
    }

    fn invocation(view: View, args: &[&str]) -> Invocation {
        let argv = std::iter::once(bin_name(view)).chain(args.iter().copied());
        Invocation::parse_from(view, argv).expect("parse invocation")
    }

    #[test]
    fn top_level_flags_precede_the_command_token() {
        let parsed = invocation(
            View::Pilet,
            &["--verbose", "--config", "ci.toml", "build", "--minify=false"],
        );
        assert!(parsed.verbose);
        assert_eq!(parsed.config, Some(PathBuf::from("ci.toml")));
        assert_eq!(
            parsed.command,
            Some((
                "build".to_string(),
                vec![OsString::from("--minify=false")]
            ))
        );
    }

    #[test]
    fn command_arguments_are_not_taken_as_top_level_flags() {
        let parsed = invocation(View::All, &["publish", "--verbose", "--url", "https://feed"]);
        assert!(!parsed.verbose);
        assert_eq!(
            parsed.command,
            Some((
                "publish".to_string(),
                vec![
                    OsString::from("--verbose"),
                    OsString::from("--url"),
                    OsString::from("https://feed"),
                ]
            ))
        );
    }

    #[test]
    fn version_is_reported_under_each_binary_name() {
        let error = Invocation::parse_from(View::Pilet, ["pilet", "--version"])
            .expect_err("version exits");
        let usage = error.downcast_ref::<clap::Error>().expect("clap error");
        assert_eq!(usage.kind(), clap::error::ErrorKind::DisplayVersion);
        assert_eq!(build_cli(View::Pilet, CommandRegistry::builtin()).get_name(), "pilet");
    }

    #[test]
    fn no_command_leaves_the_slot_empty() {
        let parsed = invocation(View::All, &["--commands-json"]);
        assert!(parsed.commands_json);
        assert!(parsed.command.is_none());
    }

    #[test]
    fn piral_binary_dispatches_scoped_names() {
        let temp = tempdir().expect("tempdir");
        let recorder = Recorder::default();
        let parsed = invocation(View::Piral, &["bundle", "src/index.html", "--type", "release"]);

        execute(View::Piral, &parsed, temp.path(), &recorder).expect("execute");

        let calls = recorder.calls();
        assert_eq!(calls.len(), 1);
        let (operation, base_dir, options) = &calls[0];
        assert_eq!(operation, "build-piral");
        assert_eq!(base_dir, temp.path());
        assert_eq!(options["entry"], "src/index.html");
        assert_eq!(options["type"], "release");
        assert_eq!(options["target"], "./dist");
    }

    #[test]
    fn pilet_binary_rejects_piral_only_commands() {
        let temp = tempdir().expect("tempdir");
        let recorder = Recorder::default();
        let parsed = invocation(View::Pilet, &["debug-piral"]);
        let error = execute(View::Pilet, &parsed, temp.path(), &recorder).expect_err("must fail");
        assert!(matches!(
            error.downcast_ref::<CommandError>(),
            Some(CommandError::UnknownCommand {
                view: View::Pilet,
                ..
            })
        ));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn config_file_supplies_publish_defaults() {
        let temp = tempdir().expect("tempdir");
        fs::create_dir_all(temp.path().join(".piral")).expect("create config dir");
        fs::write(
            temp.path().join(".piral").join("config.toml"),
            "[defaults]\nfeed_url = \"https://feed.example.org/api/v1/pilet\"\n",
        )
        .expect("write config");

        let recorder = Recorder::default();
        let parsed = invocation(View::Pilet, &["post", "--base", "packages/app"]);
        execute(View::Pilet, &parsed, temp.path(), &recorder).expect("execute");

        let calls = recorder.calls();
        let (operation, base_dir, options) = &calls[0];
        assert_eq!(operation, "publish-pilet");
        assert_eq!(base_dir, &PathBuf::from("packages/app"));
        assert_eq!(options["url"], "https://feed.example.org/api/v1/pilet");
        assert_eq!(options["source"], "*.tgz");
    }

    #[test]
    fn explicit_config_path_is_honoured() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join("ci.toml"),
            "[defaults]\nlanguage = \"js\"\nforce_overwrite = \"yes\"\n",
        )
        .expect("write config");

        let recorder = Recorder::default();
        let parsed = invocation(View::All, &["--config", "ci.toml", "scaffold-pilet"]);
        execute(View::All, &parsed, temp.path(), &recorder).expect("execute");

        let (operation, _, options) = &recorder.calls()[0];
        assert_eq!(operation, "new-pilet");
        assert_eq!(options["language"], "js");
        assert_eq!(options["forceOverwrite"], "yes");
        assert_eq!(options["source"], "piral");
    }

    #[test]
    fn broken_config_is_reported() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("bad.toml"), "[defaults\n").expect("write config");
        let parsed = invocation(View::All, &["--config", "bad.toml", "build"]);
        let error =
            execute(View::All, &parsed, temp.path(), &Recorder::default()).expect_err("must fail");
        assert!(error.to_string().contains("failed to parse"));
    }

    #[test]
    fn surface_json_lists_the_view() {
        let json = render_surface(CommandRegistry::builtin(), View::Piral).expect("render");
        let surface: Vec<CommandSummary> = serde_json::from_str(&json).expect("parse json");
        let names: Vec<&str> = surface.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, ["debug", "build", "new", "validate"]);
    }

    #[test]
    fn help_lists_commands_and_aliases() {
        let help = build_cli(View::Pilet, CommandRegistry::builtin())
            .render_help()
            .to_string();
        assert!(help.contains("publish"));
        assert!(help.contains("[aliases: post]"));
        assert!(help.contains("--commands-json"));
    }
}
