//! Built-in JSON canonicalizer: sorted keys, two-space indentation.

use std::path::Path;

use sdt_lang_api::{LangError, LangResult, LanguageProfile, TreeSource};
use serde_json::Value;

/// Registry id and `[commands.json]` key.
pub const ID: &str = "json";
/// Display name.
pub const LABEL: &str = "JSON";
/// Recognised extensions.
pub const EXTENSIONS: &[&str] = &[
    ".json", ".json5", ".4dform", ".4dproject", ".avsc", ".geojson", ".gltf", ".har", ".ice",
    ".json-tmlanguage", ".jsonl", ".mcmeta", ".tfstate", ".tfstate.backup", ".topojson",
    ".webapp", ".webmanifest", ".yy", ".yyp",
];

/// JSON is compared by canonical rendering; nothing needs stripping.
#[must_use]
pub const fn profile() -> LanguageProfile {
    LanguageProfile::canonical()
}

/// In-process canonicalizer for JSON and JSON Lines files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCanonical;

impl TreeSource for JsonCanonical {
    fn describe(&self) -> String {
        "built-in JSON canonicalizer".into()
    }

    fn dump(&self, path: &Path) -> LangResult<Vec<u8>> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| LangError::message(format!("failed to read {}: {err}", path.display())))?;
        canonicalize(&text).map(String::into_bytes)
    }
}

/// Render every top-level value of `text` with sorted object keys.
///
/// # Errors
///
/// Returns [`LangError::Failure`] when the input is not valid JSON.
pub fn canonicalize(text: &str) -> LangResult<String> {
    let mut out = String::new();
    for value in serde_json::Deserializer::from_str(text).into_iter::<Value>() {
        let value =
            value.map_err(|err| LangError::message(format!("unable to parse JSON: {err}")))?;
        let rendered = serde_json::to_string_pretty(&value)
            .map_err(|err| LangError::message(format!("unable to serialize JSON: {err}")))?;
        out.push_str(&rendered);
        out.push('\n');
    }
    Ok(out)
}
