//! Locale-bound error formatting and text localization.
//!
//! [`MessageCatalog`] holds per-language tables of error-code templates
//! and text-key templates. Templates use positional `{0}`, `{1}`, ...
//! placeholders.
//!
//! Lookup for a requested language falls back in this order:
//!
//! 1. the exact (normalized) tag, e.g. `zh-cn`
//! 2. its primary subtag, e.g. `zh`
//! 3. the catalog's default language
//! 4. a fixed fallback (`unknown error code: N`, or the text key itself)
//!
//! The catalog is immutable once built and cheap to clone; per-request
//! formatters share the same tables.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::codes::{self, ErrorCode};
use crate::error::ActionError;

/// Produces coded errors whose messages are rendered in one language.
pub trait ErrorFormatter: Send + Sync {
    /// The normalized language this formatter renders.
    fn language(&self) -> &str;

    /// A coded error carrying the catalog message for `code`.
    fn error(&self, code: ErrorCode) -> ActionError;

    /// Like [`ErrorFormatter::error`], substituting `args` into the template.
    fn errorf(&self, code: ErrorCode, args: &[&dyn fmt::Display]) -> ActionError;
}

/// Translates text keys into one language.
pub trait Localizer: Send + Sync {
    /// The normalized language this localizer renders.
    fn language(&self) -> &str;

    /// The translation for `key`, or the key itself if none exists.
    fn text(&self, key: &str) -> String;

    /// Like [`Localizer::text`], substituting `args` into the template.
    fn textf(&self, key: &str, args: &[&dyn fmt::Display]) -> String;
}

/// Builds locale-bound formatters from a request's language tag.
///
/// Implementations must be stateless per call; the dispatcher invokes
/// both methods once for every request.
pub trait LocaleFactory: Send + Sync {
    /// An error formatter bound to `language`.
    fn error_formatter(&self, language: &str) -> Arc<dyn ErrorFormatter>;

    /// A text localizer bound to `language`.
    fn localizer(&self, language: &str) -> Arc<dyn Localizer>;
}

/// Errors that can occur while loading a catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The catalog content is not valid YAML for the catalog schema.
    #[error("failed to parse catalog YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        #[from]
        source: serde_yml::Error,
    },
}

/// On-disk catalog layout.
///
/// ```yaml
/// errors:
///   en:
///     1101030: "object {0} does not exist"
/// texts:
///   en:
///     inst_name: "Instance name"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    errors: BTreeMap<String, BTreeMap<ErrorCode, String>>,
    #[serde(default)]
    texts: BTreeMap<String, BTreeMap<String, String>>,
}

/// Templates for the codes the dispatcher itself emits.
const BUILTIN_ERRORS: &[(&str, ErrorCode, &str)] = &[
    ("en", codes::SYSTEM_BUSY, "system is busy, please try again later"),
    ("en", codes::JSON_UNMARSHAL_FAILED, "failed to unmarshal the request body as JSON"),
    ("en", codes::JSON_MARSHAL_FAILED, "failed to marshal the response as JSON"),
    ("en", codes::HTTP_READ_BODY_FAILED, "failed to read the request body"),
    ("en", codes::PARAMS_INVALID, "invalid request parameter: {0}"),
    ("zh-cn", codes::SYSTEM_BUSY, "系统繁忙，请稍后重试"),
    ("zh-cn", codes::JSON_UNMARSHAL_FAILED, "请求体 JSON 解析失败"),
    ("zh-cn", codes::JSON_MARSHAL_FAILED, "响应数据 JSON 序列化失败"),
    ("zh-cn", codes::HTTP_READ_BODY_FAILED, "读取 HTTP 请求体失败"),
    ("zh-cn", codes::PARAMS_INVALID, "请求参数无效: {0}"),
];

#[derive(Debug)]
struct CatalogData {
    default_language: String,
    errors: BTreeMap<String, BTreeMap<ErrorCode, String>>,
    texts: BTreeMap<String, BTreeMap<String, String>>,
}

/// File-backed [`LocaleFactory`].
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    inner: Arc<CatalogData>,
}

impl MessageCatalog {
    /// A catalog containing only the built-in dispatcher messages.
    pub fn builtin(default_language: &str) -> Self {
        Self::from_file(default_language, CatalogFile::default())
    }

    /// Parse a catalog from YAML, layered over the built-in messages.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Yaml`] if the string is not a valid catalog.
    pub fn parse(default_language: &str, yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yml::from_str(yaml)?;
        Ok(Self::from_file(default_language, file))
    }

    /// Load a catalog file from disk, layered over the built-in messages.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, or
    /// [`CatalogError::Yaml`] if its content is not a valid catalog.
    pub fn load(default_language: &str, path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(default_language, &contents)
    }

    fn from_file(default_language: &str, file: CatalogFile) -> Self {
        let mut errors: BTreeMap<String, BTreeMap<ErrorCode, String>> = BTreeMap::new();
        for (language, code, template) in BUILTIN_ERRORS {
            errors
                .entry((*language).to_owned())
                .or_default()
                .insert(*code, (*template).to_owned());
        }
        for (language, table) in file.errors {
            errors
                .entry(normalize_language(&language))
                .or_default()
                .extend(table);
        }

        let mut texts: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (language, table) in file.texts {
            texts
                .entry(normalize_language(&language))
                .or_default()
                .extend(table);
        }

        Self {
            inner: Arc::new(CatalogData {
                default_language: normalize_language(default_language),
                errors,
                texts,
            }),
        }
    }

    /// The raw template for `code` in `language`, after fallback.
    pub fn error_message(&self, language: &str, code: ErrorCode) -> String {
        lookup(&self.inner.errors, language, &self.inner.default_language, &code).map_or_else(
            || {
                debug!(code, language, "no catalog entry for error code");
                format!("unknown error code: {code}")
            },
            ToOwned::to_owned,
        )
    }

    /// The raw template for `key` in `language`, after fallback.
    pub fn text(&self, language: &str, key: &str) -> String {
        lookup(&self.inner.texts, language, &self.inner.default_language, key)
            .map_or_else(|| key.to_owned(), ToOwned::to_owned)
    }

    fn bound_language(&self, language: &str) -> String {
        let normalized = normalize_language(language);
        if normalized.is_empty() {
            self.inner.default_language.clone()
        } else {
            normalized
        }
    }
}

impl LocaleFactory for MessageCatalog {
    fn error_formatter(&self, language: &str) -> Arc<dyn ErrorFormatter> {
        Arc::new(CatalogErrors {
            catalog: self.clone(),
            language: self.bound_language(language),
        })
    }

    fn localizer(&self, language: &str) -> Arc<dyn Localizer> {
        Arc::new(CatalogLocalizer {
            catalog: self.clone(),
            language: self.bound_language(language),
        })
    }
}

struct CatalogErrors {
    catalog: MessageCatalog,
    language: String,
}

impl ErrorFormatter for CatalogErrors {
    fn language(&self) -> &str {
        &self.language
    }

    fn error(&self, code: ErrorCode) -> ActionError {
        ActionError::coded(code, self.catalog.error_message(&self.language, code))
    }

    fn errorf(&self, code: ErrorCode, args: &[&dyn fmt::Display]) -> ActionError {
        let template = self.catalog.error_message(&self.language, code);
        ActionError::coded(code, substitute(&template, args))
    }
}

struct CatalogLocalizer {
    catalog: MessageCatalog,
    language: String,
}

impl Localizer for CatalogLocalizer {
    fn language(&self) -> &str {
        &self.language
    }

    fn text(&self, key: &str) -> String {
        self.catalog.text(&self.language, key)
    }

    fn textf(&self, key: &str, args: &[&dyn fmt::Display]) -> String {
        substitute(&self.catalog.text(&self.language, key), args)
    }
}

/// Normalize a language tag: trimmed, lowercased, `_` replaced by `-`.
///
/// `"zh_CN"` becomes `"zh-cn"`; an empty or blank tag stays empty.
pub fn normalize_language(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', "-")
}

fn lookup<'a, K, Q>(
    tables: &'a BTreeMap<String, BTreeMap<K, String>>,
    language: &str,
    default_language: &str,
    key: &Q,
) -> Option<&'a str>
where
    K: Ord + std::borrow::Borrow<Q>,
    Q: Ord + ?Sized,
{
    let language = normalize_language(language);
    let primary = language.split('-').next().unwrap_or_default();

    [language.as_str(), primary, default_language]
        .into_iter()
        .filter(|candidate| !candidate.is_empty())
        .find_map(|candidate| tables.get(candidate).and_then(|table| table.get(key)))
        .map(String::as_str)
}

/// Replace `{N}` placeholders with the `N`th argument.
///
/// Placeholders without a matching argument are left as written.
fn substitute(template: &str, args: &[&dyn fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some((head, tail)) = rest.split_once('{') {
        out.push_str(head);
        match tail.split_once('}') {
            Some((inner, remaining)) => {
                match inner.parse::<usize>().ok().and_then(|i| args.get(i)) {
                    Some(arg) => out.push_str(&arg.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(inner);
                        out.push('}');
                    }
                }
                rest = remaining;
            }
            None => {
                out.push('{');
                out.push_str(tail);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
