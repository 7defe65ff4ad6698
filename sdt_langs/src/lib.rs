//! Built-in language definitions for the semantic diff engine.

mod command;
pub mod golang;
pub mod javascript;
pub mod json;
pub mod python;
pub mod ruby;
pub mod sql;
pub mod treesitter;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub use command::{CommandSource, DEFAULT_TIMEOUT};
pub use json::JsonCanonical;
pub use sql::SqlCanonical;
pub use treesitter::TreeSitterSource;

use sdt_lang_api::{CommandSpec, Config, LangError, LangResult, Language, LanguageRegistry, TreeSource};

/// Default command for every built-in language, keyed by language id.
#[must_use]
pub fn default_commands() -> BTreeMap<String, CommandSpec> {
    [
        (ruby::ID, ruby::default_command()),
        (python::ID, python::default_command()),
        (javascript::ID, javascript::default_command()),
        (golang::ID, golang::default_command()),
        (sql::ID, CommandSpec::built_in()),
        (json::ID, CommandSpec::built_in()),
        (treesitter::ID, CommandSpec::built_in()),
    ]
    .into_iter()
    .map(|(id, command)| (id.to_owned(), command))
    .collect()
}

/// Build a registry populated with the built-in languages and default commands.
///
/// # Errors
///
/// Returns an error if a built-in profile fails to compile.
pub fn default_registry() -> LangResult<LanguageRegistry> {
    registry_with(&Config::default())
}

/// Build a registry whose commands are the defaults overridden by `config`.
///
/// The merge happens here, once; the returned registry is not meant to be
/// modified afterwards.
///
/// # Errors
///
/// Returns an error if a built-in profile fails to compile or a language
/// without an in-process implementation is configured as `BUILT-IN`.
pub fn registry_with(config: &Config) -> LangResult<LanguageRegistry> {
    let mut commands = default_commands();
    for (id, command) in &config.commands {
        commands.insert(id.clone(), command.clone());
    }
    let timeout = config.timeout_secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs);
    let keep_comments = std::env::var_os(treesitter::KEEP_COMMENTS_ENV).is_some();

    let command = |id: &str| -> CommandSpec {
        commands
            .get(id)
            .cloned()
            .unwrap_or_else(CommandSpec::built_in)
    };
    let external = |id: &str| -> LangResult<Arc<dyn TreeSource>> {
        let spec = command(id);
        if spec.is_built_in() {
            return Err(LangError::message(format!(
                "{id} has no built-in implementation; configure an executable"
            )));
        }
        Ok(Arc::new(CommandSource::new(spec).with_timeout(timeout)))
    };
    let canonical = |id: &str, built_in: Arc<dyn TreeSource>| -> Arc<dyn TreeSource> {
        let spec = command(id);
        if spec.is_built_in() {
            built_in
        } else {
            Arc::new(CommandSource::new(spec).with_timeout(timeout))
        }
    };

    let mut registry = LanguageRegistry::new();
    registry.register(Language::new(
        ruby::ID,
        ruby::LABEL,
        ruby::EXTENSIONS,
        ruby::profile()?,
        external(ruby::ID)?,
    ));
    registry.register(Language::new(
        python::ID,
        python::LABEL,
        python::EXTENSIONS,
        python::profile()?,
        external(python::ID)?,
    ));
    registry.register(Language::new(
        javascript::ID,
        javascript::LABEL,
        javascript::EXTENSIONS,
        javascript::profile()?,
        external(javascript::ID)?,
    ));
    registry.register(Language::new(
        golang::ID,
        golang::LABEL,
        golang::EXTENSIONS,
        golang::profile()?,
        external(golang::ID)?,
    ));
    registry.register(Language::new(
        sql::ID,
        sql::LABEL,
        sql::EXTENSIONS,
        sql::profile(),
        canonical(sql::ID, Arc::new(SqlCanonical)),
    ));
    registry.register(Language::new(
        json::ID,
        json::LABEL,
        json::EXTENSIONS,
        json::profile(),
        canonical(json::ID, Arc::new(JsonCanonical)),
    ));

    let parser = CommandSource::new(treesitter::parser_command()).with_timeout(timeout);
    let adapter: Arc<dyn TreeSource> = Arc::new(TreeSitterSource::new(parser, keep_comments)?);
    registry.register_fallback(Language::new(
        treesitter::ID,
        treesitter::LABEL,
        &[],
        treesitter::profile()?,
        canonical(treesitter::ID, adapter),
    ));

    Ok(registry)
}
