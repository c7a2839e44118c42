use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use anyhow::Result;
use serde::Deserialize;

use crate::apps::{
    AppDefaults, Apps, BuildPiletOptions, BuildPiralOptions, DebugPiletOptions, DebugPiralOptions,
    NewPiletOptions, NewPiralOptions, PackPiletOptions, PublishPiletOptions, UpgradePiletOptions,
    ValidatePiletOptions, ValidatePiralOptions,
};
use crate::choices::{
    BUILD_TYPE_KEYS, BuildType, FORCE_OVERWRITE_KEYS, ForceOverwrite, PILET_LANGUAGE_KEYS,
    PiletLanguage, TEMPLATE_TYPE_KEYS, TemplateType,
};
use crate::command::{CommandDescriptor, CommandRunner, CommandSummary, Options, Scope, View};
use crate::schema::FlagSet;
use crate::specialize::specialize_scope;

static BUILTIN: LazyLock<CommandRegistry> =
    LazyLock::new(|| CommandRegistry::new(&AppDefaults::default()));

/// The full, ordered command list plus its scoped views.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    all: Vec<CommandDescriptor>,
}

impl CommandRegistry {
    /// Builds the registry with flag defaults taken from `defaults`.
    pub fn new(defaults: &AppDefaults) -> Self {
        Self {
            all: all_commands(defaults),
        }
    }

    /// Registry over stock defaults, built once per process.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    pub fn all(&self) -> &[CommandDescriptor] {
        &self.all
    }

    pub fn piral(&self) -> Vec<CommandDescriptor> {
        specialize_scope(&self.all, Scope::Piral)
    }

    pub fn pilet(&self) -> Vec<CommandDescriptor> {
        specialize_scope(&self.all, Scope::Pilet)
    }

    pub fn view(&self, view: View) -> Cow<'_, [CommandDescriptor]> {
        match view.scope() {
            None => Cow::Borrowed(&self.all),
            Some(scope) => Cow::Owned(specialize_scope(&self.all, scope)),
        }
    }

    pub fn surface(&self, view: View) -> Vec<CommandSummary> {
        self.view(view)
            .iter()
            .map(CommandDescriptor::summary)
            .collect()
    }
}

fn command<R>(
    name: &str,
    aliases: &[&str],
    description: &'static str,
    arguments: &'static [&'static str],
    scope: Scope,
    flags: FlagSet,
    run: R,
) -> CommandDescriptor
where
    R: CommandRunner + 'static,
{
    CommandDescriptor {
        name: name.to_string(),
        aliases: aliases.iter().map(|alias| (*alias).to_string()).collect(),
        description,
        arguments,
        scope: Some(scope),
        flags: Arc::new(flags),
        run: Arc::new(run),
    }
}

fn all_commands(defaults: &AppDefaults) -> Vec<CommandDescriptor> {
    vec![
        command(
            "debug-piral",
            &["watch-piral", "debug-portal", "watch-portal"],
            "Starts the debugging process for a Piral instance.",
            &["[source]"],
            Scope::Piral,
            debug_piral_flags(&defaults.debug_piral),
            run_debug_piral,
        ),
        command(
            "build-piral",
            &["bundle-piral", "build-portal", "bundle-portal"],
            "Creates a production build for a Piral instance.",
            &["[source]"],
            Scope::Piral,
            build_piral_flags(&defaults.build_piral),
            run_build_piral,
        ),
        command(
            "new-piral",
            &["create-piral", "scaffold-piral", "setup-piral"],
            "Creates a new Piral instance by adding all files and changes to the current project.",
            &["[target]"],
            Scope::Piral,
            new_piral_flags(&defaults.new_piral),
            run_new_piral,
        ),
        command(
            "validate-piral",
            &["verify-piral", "check-piral"],
            "Checks the validity of the current project as a Piral instance.",
            &["[source]"],
            Scope::Piral,
            validate_piral_flags(&defaults.validate_piral),
            run_validate_piral,
        ),
        command(
            "debug-pilet",
            &["watch-pilet", "debug", "watch"],
            "Starts the debugging process for a pilet using a Piral instance.",
            &["[source]"],
            Scope::Pilet,
            debug_pilet_flags(&defaults.debug_pilet),
            run_debug_pilet,
        ),
        command(
            "build-pilet",
            &["bundle-pilet", "build", "bundle"],
            "Creates a production build for a pilet.",
            &["[source]"],
            Scope::Pilet,
            build_pilet_flags(&defaults.build_pilet),
            run_build_pilet,
        ),
        command(
            "pack-pilet",
            &["package-pilet", "pack", "package"],
            "Creates a pilet package that can be published.",
            &["[source]"],
            Scope::Pilet,
            pack_pilet_flags(&defaults.pack_pilet),
            run_pack_pilet,
        ),
        command(
            "publish-pilet",
            &["post-pilet", "publish"],
            "Publishes a pilet package to a pilet feed.",
            &["[source]"],
            Scope::Pilet,
            publish_pilet_flags(&defaults.publish_pilet),
            run_publish_pilet,
        ),
        command(
            "new-pilet",
            &["create-pilet", "scaffold-pilet", "scaffold", "new", "create"],
            "Scaffolds a new pilet for a specified Piral instance.",
            &["[source]"],
            Scope::Pilet,
            new_pilet_flags(&defaults.new_pilet),
            run_new_pilet,
        ),
        command(
            "upgrade-pilet",
            &["upgrade"],
            "Upgrades an existing pilet to the latest version of the used Piral instance.",
            &[],
            Scope::Pilet,
            upgrade_pilet_flags(&defaults.upgrade_pilet),
            run_upgrade_pilet,
        ),
        command(
            "validate-pilet",
            &["verify-pilet", "check-pilet", "lint-pilet", "assert-pilet"],
            "Checks the validity of the current pilet according to the rules defined by the Piral instance.",
            &["[source]"],
            Scope::Pilet,
            validate_pilet_flags(&defaults.validate_pilet),
            run_validate_pilet,
        ),
    ]
}

const SOURCE_ROOT_HELP: &str =
    "Sets the source root directory or index.html file for collecting all the information.";
const CACHE_DIR_HELP: &str = "Sets the cache directory for bundling.";
const PUBLIC_URL_HELP: &str = "Sets the public URL (path) of the bundle.";
const LOG_LEVEL_HELP: &str = "Sets the log level to use (1-5).";
const SCOPE_HOIST_HELP: &str = "Tries to reduce bundle size by introducing tree shaking.";
const HMR_HELP: &str = "Activates Hot Module Reloading (HMR).";
const AUTOINSTALL_HELP: &str = "Automatically installs missing Node.js packages.";
const CONTENT_HASH_HELP: &str = "Appends the hash to the side-bundle files.";
const DETAILED_REPORT_HELP: &str = "Sets if a detailed report should be created.";
const MINIFY_HELP: &str = "Performs minification or other post-bundle transformations.";
const FRESH_BUILD_HELP: &str = "Performs a fresh build by removing the target directory first.";
const FRESH_DEBUG_HELP: &str = "Resets the cache before starting the debug mode.";
const SKIP_INSTALL_HELP: &str = "Skips the installation of the dependencies using NPM.";
const TEMPLATE_HELP: &str = "Sets the boilerplate template to be used when scaffolding.";
const APP_NAME_HELP: &str = "Sets the name of the Piral instance.";

fn debug_piral_flags(defaults: &DebugPiralOptions) -> FlagSet {
    FlagSet::new()
        .positional("source", SOURCE_ROOT_HELP)
        .with_default(&defaults.entry)
        .number("port", "Sets the port of the local development server.")
        .with_default(defaults.port)
        .string("cache-dir", CACHE_DIR_HELP)
        .with_default(&defaults.cache_dir)
        .string("public-url", PUBLIC_URL_HELP)
        .with_default(&defaults.public_url)
        .number("log-level", LOG_LEVEL_HELP)
        .with_default(defaults.log_level)
        .boolean("fresh", FRESH_DEBUG_HELP)
        .with_default(defaults.fresh)
        .boolean("open", "Opens the Piral instance directly in the browser.")
        .with_default(defaults.open)
        .boolean("scope-hoist", SCOPE_HOIST_HELP)
        .with_default(defaults.scope_hoist)
        .boolean("hmr", HMR_HELP)
        .with_default(defaults.hmr)
        .boolean("autoinstall", AUTOINSTALL_HELP)
        .with_default(defaults.auto_install)
        .base()
}

fn build_piral_flags(defaults: &BuildPiralOptions) -> FlagSet {
    FlagSet::new()
        .positional("source", SOURCE_ROOT_HELP)
        .with_default(&defaults.entry)
        .string("target", "Sets the target directory or file of bundling.")
        .with_default(&defaults.target)
        .string("cache-dir", CACHE_DIR_HELP)
        .with_default(&defaults.cache_dir)
        .string("public-url", PUBLIC_URL_HELP)
        .with_default(&defaults.public_url)
        .boolean("detailed-report", DETAILED_REPORT_HELP)
        .with_default(defaults.detailed_report)
        .number("log-level", LOG_LEVEL_HELP)
        .with_default(defaults.log_level)
        .boolean("fresh", FRESH_BUILD_HELP)
        .with_default(defaults.fresh)
        .boolean("minify", MINIFY_HELP)
        .with_default(defaults.minify)
        .boolean("source-maps", "Create associated source maps for the bundles.")
        .with_default(defaults.source_maps)
        .boolean("content-hash", CONTENT_HASH_HELP)
        .with_default(defaults.content_hash)
        .boolean("scope-hoist", SCOPE_HOIST_HELP)
        .with_default(defaults.scope_hoist)
        .choices(
            "type",
            BUILD_TYPE_KEYS,
            "Selects the target type of the build. \"all\" builds all target types.",
        )
        .with_default(defaults.build_type.key())
        .base()
}

fn new_piral_flags(defaults: &NewPiralOptions) -> FlagSet {
    FlagSet::new()
        .positional("target", "Sets the project's root directory for making the changes.")
        .with_default(&defaults.target)
        .string("app", "Sets the path to the app's source HTML file.")
        .with_default(&defaults.app)
        .boolean(
            "only-core",
            "Sets if \"piral-core\" should be used. Otherwise, \"piral\" is used.",
        )
        .with_default(defaults.only_core)
        .boolean("skip-install", SKIP_INSTALL_HELP)
        .with_default(defaults.skip_install)
        .string(
            "tag",
            "Sets the tag or version of the package to install. By default, it is \"latest\".",
        )
        .with_default(&defaults.version)
        .choices(
            "force-overwrite",
            FORCE_OVERWRITE_KEYS,
            "Determines if files should be overwritten by the installation.",
        )
        .with_default(defaults.force_overwrite.key())
        .choices(
            "language",
            PILET_LANGUAGE_KEYS,
            "Determines the programming language for the new Piral instance.",
        )
        .with_default(defaults.language.key())
        .choices("template", TEMPLATE_TYPE_KEYS, TEMPLATE_HELP)
        .with_default(defaults.template.key())
        .base()
}

fn validate_piral_flags(defaults: &ValidatePiralOptions) -> FlagSet {
    FlagSet::new()
        .positional("source", SOURCE_ROOT_HELP)
        .with_default(&defaults.entry)
        .number("log-level", LOG_LEVEL_HELP)
        .with_default(defaults.log_level)
        .base()
}

fn debug_pilet_flags(defaults: &DebugPiletOptions) -> FlagSet {
    FlagSet::new()
        .positional("source", "Sets the source file containing the pilet root module.")
        .with_default(&defaults.entry)
        .number("port", "Sets the port of the local development server.")
        .with_default(defaults.port)
        .string("cache-dir", CACHE_DIR_HELP)
        .with_default(&defaults.cache_dir)
        .number("log-level", LOG_LEVEL_HELP)
        .with_default(defaults.log_level)
        .boolean("fresh", FRESH_DEBUG_HELP)
        .with_default(defaults.fresh)
        .boolean("open", "Opens the pilet directly in the browser.")
        .with_default(defaults.open)
        .boolean("scope-hoist", SCOPE_HOIST_HELP)
        .with_default(defaults.scope_hoist)
        .boolean("hmr", HMR_HELP)
        .with_default(defaults.hmr)
        .boolean("autoinstall", AUTOINSTALL_HELP)
        .with_default(defaults.auto_install)
        .string("app", APP_NAME_HELP)
        .with_optional_default(defaults.app.as_ref())
        .base()
}

fn build_pilet_flags(defaults: &BuildPiletOptions) -> FlagSet {
    FlagSet::new()
        .positional("source", "Sets the source index.tsx file for collecting all the information.")
        .with_default(&defaults.entry)
        .string("target", "Sets the target file of bundling.")
        .with_default(&defaults.target)
        .string("cache-dir", CACHE_DIR_HELP)
        .with_default(&defaults.cache_dir)
        .boolean("detailed-report", DETAILED_REPORT_HELP)
        .with_default(defaults.detailed_report)
        .number("log-level", LOG_LEVEL_HELP)
        .with_default(defaults.log_level)
        .boolean("fresh", FRESH_BUILD_HELP)
        .with_default(defaults.fresh)
        .boolean("minify", MINIFY_HELP)
        .with_default(defaults.minify)
        .boolean("source-maps", "Creates source maps for the bundles.")
        .with_default(defaults.source_maps)
        .boolean("content-hash", CONTENT_HASH_HELP)
        .with_default(defaults.content_hash)
        .boolean("scope-hoist", SCOPE_HOIST_HELP)
        .with_default(defaults.scope_hoist)
        .base()
}

fn pack_pilet_flags(defaults: &PackPiletOptions) -> FlagSet {
    FlagSet::new()
        .positional("source", "Sets the source package.json file for creating the package.")
        .with_default(&defaults.source)
        .string("target", "Sets the target directory or file of packing.")
        .with_default(&defaults.target)
        .base()
}

fn publish_pilet_flags(defaults: &PublishPiletOptions) -> FlagSet {
    FlagSet::new()
        .positional("source", "Sets the source previously packed *.tgz bundle to publish.")
        .with_default(&defaults.source)
        .string("url", "Sets the explicit URL where to publish the pilet to.")
        .with_optional_default(non_empty(&defaults.url))
        .required()
        .string("api-key", "Sets the potential API key to send to the service.")
        .with_default(&defaults.api_key)
        .boolean(
            "fresh",
            "Performs a fresh build, then packages and finally publishes the pilet.",
        )
        .with_default(defaults.fresh)
        .base()
}

fn new_pilet_flags(defaults: &NewPiletOptions) -> FlagSet {
    FlagSet::new()
        .positional(
            "source",
            "Sets the source package containing a Piral instance for templating the scaffold process.",
        )
        .with_default(&defaults.source)
        .string(
            "target",
            "Sets the target directory for scaffolding. By default, the current directory.",
        )
        .with_default(&defaults.target)
        .string(
            "registry",
            "Sets the package registry to use for resolving the specified Piral app.",
        )
        .with_default(&defaults.registry)
        .boolean("skip-install", SKIP_INSTALL_HELP)
        .with_default(defaults.skip_install)
        .choices(
            "force-overwrite",
            FORCE_OVERWRITE_KEYS,
            "Determines if files should be overwritten by the scaffolding.",
        )
        .with_default(defaults.force_overwrite.key())
        .choices(
            "language",
            PILET_LANGUAGE_KEYS,
            "Determines the programming language for the new pilet.",
        )
        .with_default(defaults.language.key())
        .choices("template", TEMPLATE_TYPE_KEYS, TEMPLATE_HELP)
        .with_default(defaults.template.key())
        .base()
}

fn upgrade_pilet_flags(defaults: &UpgradePiletOptions) -> FlagSet {
    FlagSet::new()
        .string(
            "target",
            "Sets the target directory to upgrade. By default, the current directory.",
        )
        .with_default(&defaults.target)
        .string(
            "tag",
            "Sets the tag or version of the Piral instance to upgrade to. By default, it is \"latest\".",
        )
        .with_default(&defaults.version)
        .choices(
            "force-overwrite",
            FORCE_OVERWRITE_KEYS,
            "Determines if files should be overwritten by the upgrading process.",
        )
        .with_default(defaults.force_overwrite.key())
        .base()
}

fn validate_pilet_flags(defaults: &ValidatePiletOptions) -> FlagSet {
    FlagSet::new()
        .positional("source", "Sets the source file containing the pilet root module.")
        .with_default(&defaults.entry)
        .number("log-level", LOG_LEVEL_HELP)
        .with_default(defaults.log_level)
        .string("app", APP_NAME_HELP)
        .with_optional_default(defaults.app.as_ref())
        .base()
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugPiralArgs {
    base: PathBuf,
    source: String,
    port: u16,
    cache_dir: String,
    public_url: String,
    log_level: u8,
    fresh: bool,
    open: bool,
    scope_hoist: bool,
    hmr: bool,
    autoinstall: bool,
}

fn run_debug_piral(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: DebugPiralArgs = options.parse("debug-piral")?;
    apps.debug_piral(
        &args.base,
        DebugPiralOptions {
            entry: args.source,
            cache_dir: args.cache_dir,
            port: args.port,
            hmr: args.hmr,
            auto_install: args.autoinstall,
            scope_hoist: args.scope_hoist,
            public_url: args.public_url,
            log_level: args.log_level,
            fresh: args.fresh,
            open: args.open,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildPiralArgs {
    base: PathBuf,
    source: String,
    target: String,
    cache_dir: String,
    public_url: String,
    detailed_report: bool,
    log_level: u8,
    fresh: bool,
    minify: bool,
    source_maps: bool,
    content_hash: bool,
    scope_hoist: bool,
    #[serde(rename = "type")]
    build_type: BuildType,
}

fn run_build_piral(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: BuildPiralArgs = options.parse("build-piral")?;
    apps.build_piral(
        &args.base,
        BuildPiralOptions {
            entry: args.source,
            target: args.target,
            cache_dir: args.cache_dir,
            public_url: args.public_url,
            minify: args.minify,
            scope_hoist: args.scope_hoist,
            content_hash: args.content_hash,
            source_maps: args.source_maps,
            detailed_report: args.detailed_report,
            log_level: args.log_level,
            fresh: args.fresh,
            build_type: args.build_type,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewPiralArgs {
    base: PathBuf,
    target: String,
    app: String,
    only_core: bool,
    skip_install: bool,
    tag: String,
    force_overwrite: ForceOverwrite,
    language: PiletLanguage,
    template: TemplateType,
}

fn run_new_piral(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: NewPiralArgs = options.parse("new-piral")?;
    apps.new_piral(
        &args.base,
        NewPiralOptions {
            app: args.app,
            target: args.target,
            only_core: args.only_core,
            version: args.tag,
            force_overwrite: args.force_overwrite,
            language: args.language,
            skip_install: args.skip_install,
            template: args.template,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidatePiralArgs {
    base: PathBuf,
    source: String,
    log_level: u8,
}

fn run_validate_piral(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: ValidatePiralArgs = options.parse("validate-piral")?;
    apps.validate_piral(
        &args.base,
        ValidatePiralOptions {
            entry: args.source,
            log_level: args.log_level,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugPiletArgs {
    base: PathBuf,
    source: String,
    port: u16,
    cache_dir: String,
    log_level: u8,
    fresh: bool,
    open: bool,
    scope_hoist: bool,
    hmr: bool,
    autoinstall: bool,
    app: Option<String>,
}

fn run_debug_pilet(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: DebugPiletArgs = options.parse("debug-pilet")?;
    apps.debug_pilet(
        &args.base,
        DebugPiletOptions {
            entry: args.source,
            cache_dir: args.cache_dir,
            port: args.port,
            scope_hoist: args.scope_hoist,
            hmr: args.hmr,
            auto_install: args.autoinstall,
            app: args.app,
            log_level: args.log_level,
            fresh: args.fresh,
            open: args.open,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildPiletArgs {
    base: PathBuf,
    source: String,
    target: String,
    cache_dir: String,
    detailed_report: bool,
    log_level: u8,
    fresh: bool,
    minify: bool,
    source_maps: bool,
    content_hash: bool,
    scope_hoist: bool,
}

fn run_build_pilet(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: BuildPiletArgs = options.parse("build-pilet")?;
    apps.build_pilet(
        &args.base,
        BuildPiletOptions {
            entry: args.source,
            target: args.target,
            cache_dir: args.cache_dir,
            minify: args.minify,
            content_hash: args.content_hash,
            source_maps: args.source_maps,
            scope_hoist: args.scope_hoist,
            detailed_report: args.detailed_report,
            fresh: args.fresh,
            log_level: args.log_level,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackPiletArgs {
    base: PathBuf,
    source: String,
    target: String,
}

fn run_pack_pilet(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: PackPiletArgs = options.parse("pack-pilet")?;
    apps.pack_pilet(
        &args.base,
        PackPiletOptions {
            source: args.source,
            target: args.target,
        },
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishPiletArgs {
    base: PathBuf,
    source: String,
    url: String,
    api_key: String,
    fresh: bool,
}

fn run_publish_pilet(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: PublishPiletArgs = options.parse("publish-pilet")?;
    apps.publish_pilet(
        &args.base,
        PublishPiletOptions {
            source: args.source,
            url: args.url,
            api_key: args.api_key,
            fresh: args.fresh,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewPiletArgs {
    base: PathBuf,
    source: String,
    target: String,
    registry: String,
    skip_install: bool,
    force_overwrite: ForceOverwrite,
    language: PiletLanguage,
    template: TemplateType,
}

fn run_new_pilet(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: NewPiletArgs = options.parse("new-pilet")?;
    apps.new_pilet(
        &args.base,
        NewPiletOptions {
            target: args.target,
            source: args.source,
            registry: args.registry,
            force_overwrite: args.force_overwrite,
            language: args.language,
            skip_install: args.skip_install,
            template: args.template,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpgradePiletArgs {
    base: PathBuf,
    target: String,
    tag: String,
    force_overwrite: ForceOverwrite,
}

fn run_upgrade_pilet(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: UpgradePiletArgs = options.parse("upgrade-pilet")?;
    apps.upgrade_pilet(
        &args.base,
        UpgradePiletOptions {
            target: args.target,
            version: args.tag,
            force_overwrite: args.force_overwrite,
        },
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidatePiletArgs {
    base: PathBuf,
    source: String,
    log_level: u8,
    app: Option<String>,
}

fn run_validate_pilet(apps: &dyn Apps, options: Options) -> Result<()> {
    let args: ValidatePiletArgs = options.parse("validate-pilet")?;
    apps.validate_pilet(
        &args.base,
        ValidatePiletOptions {
            entry: args.source,
            log_level: args.log_level,
            app: args.app,
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::command::{PILET_SUFFIX, PIRAL_SUFFIX};
    use crate::specialize::specialize;

    fn find<'a>(view: &'a [CommandDescriptor], name: &str) -> &'a CommandDescriptor {
        view.iter()
            .find(|command| command.name == name)
            .unwrap_or_else(|| panic!("missing command {name}"))
    }

    #[test]
    fn all_view_keeps_declaration_order() {
        let names: Vec<&str> = CommandRegistry::builtin()
            .all()
            .iter()
            .map(|command| command.name.as_str())
            .collect();
        assert_eq!(
            names,
            [
                "debug-piral",
                "build-piral",
                "new-piral",
                "validate-piral",
                "debug-pilet",
                "build-pilet",
                "pack-pilet",
                "publish-pilet",
                "new-pilet",
                "upgrade-pilet",
                "validate-pilet",
            ]
        );
    }

    #[test]
    fn names_are_unique_across_the_registry() {
        let mut seen = HashSet::new();
        for command in CommandRegistry::builtin().all() {
            assert!(seen.insert(command.name.as_str()), "{}", command.name);
        }
    }

    #[test]
    fn scope_tags_agree_with_name_suffixes() {
        for command in CommandRegistry::builtin().all() {
            let scope = command.scope.expect("every built-in command is scoped");
            assert!(command.name.ends_with(scope.suffix()), "{}", command.name);
            assert_ne!(command.name, scope.suffix());
        }
    }

    #[test]
    fn piral_view_renames_commands() {
        let piral = CommandRegistry::builtin().piral();
        let names: Vec<&str> = piral.iter().map(|command| command.name.as_str()).collect();
        assert_eq!(names, ["debug", "build", "new", "validate"]);

        assert_eq!(find(&piral, "debug").aliases, ["watch"]);
        assert_eq!(find(&piral, "build").aliases, ["bundle"]);
        assert_eq!(find(&piral, "new").aliases, ["create", "scaffold", "setup"]);
        assert_eq!(find(&piral, "validate").aliases, ["verify", "check"]);
    }

    #[test]
    fn pilet_view_renames_commands() {
        let pilet = CommandRegistry::builtin().pilet();
        let names: Vec<&str> = pilet.iter().map(|command| command.name.as_str()).collect();
        assert_eq!(
            names,
            ["debug", "build", "pack", "publish", "new", "upgrade", "validate"]
        );

        assert_eq!(find(&pilet, "debug").aliases, ["watch"]);
        assert_eq!(find(&pilet, "pack").aliases, ["package"]);
        assert_eq!(find(&pilet, "publish").aliases, ["post"]);
        assert_eq!(find(&pilet, "new").aliases, ["create", "scaffold"]);
        assert!(find(&pilet, "upgrade").aliases.is_empty());
        assert_eq!(
            find(&pilet, "validate").aliases,
            ["verify", "check", "lint", "assert"]
        );
    }

    #[test]
    fn view_matches_the_dedicated_accessors() {
        let registry = CommandRegistry::builtin();
        assert_eq!(registry.view(View::All).len(), registry.all().len());
        assert_eq!(
            format!("{:?}", registry.view(View::Piral)),
            format!("{:?}", registry.piral())
        );
        assert_eq!(
            format!("{:?}", registry.view(View::Pilet)),
            format!("{:?}", registry.pilet())
        );
    }

    #[test]
    fn tagged_views_match_suffix_specialization() {
        let registry = CommandRegistry::builtin();
        assert_eq!(
            format!("{:?}", registry.piral()),
            format!("{:?}", specialize(registry.all(), PIRAL_SUFFIX))
        );
        assert_eq!(
            format!("{:?}", registry.pilet()),
            format!("{:?}", specialize(registry.all(), PILET_SUFFIX))
        );
    }

    #[test]
    fn surface_lists_scoped_names() {
        let surface = CommandRegistry::builtin().surface(View::Pilet);
        let publish = surface
            .iter()
            .find(|summary| summary.name == "publish")
            .expect("publish");
        assert_eq!(publish.aliases, ["post"]);
        assert_eq!(publish.scope, Some(Scope::Pilet));
        assert_eq!(publish.arguments, ["[source]"]);
    }

    #[test]
    fn build_pilet_reads_separate_boolean_values() {
        let build = find(CommandRegistry::builtin().all(), "build-pilet");
        let parser = crate::schema::CommandParser::for_descriptor(build);
        let options = parser
            .parse(["--minify", "false", "src/app.tsx"], std::path::Path::new("/work"))
            .expect("parse");
        assert_eq!(options.get("minify"), Some(&serde_json::Value::from(false)));
        assert_eq!(options.get("source"), Some(&serde_json::Value::from("src/app.tsx")));
    }

    #[test]
    fn configured_defaults_reach_the_flag_schema() {
        let mut defaults = AppDefaults::default();
        defaults.publish_pilet.url = "https://feed.example.org/api/v1/pilet".to_string();
        let registry = CommandRegistry::new(&defaults);
        let publish = find(registry.all(), "publish-pilet");

        let parser = crate::schema::CommandParser::for_descriptor(publish);
        let url = parser
            .specs()
            .iter()
            .find(|spec| spec.name == "url")
            .expect("url flag");
        assert_eq!(
            url.default,
            Some(crate::schema::DefaultValue::Text(
                "https://feed.example.org/api/v1/pilet".to_string()
            ))
        );
        assert!(url.required);
    }
}
