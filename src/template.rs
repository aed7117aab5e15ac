//! Template Engine
//!
//! Single-pass `{{name}}` substitution for system prompts and note bodies.
//! Unknown variables are left untouched; substituted values are never scanned
//! again, so generated text containing `{{...}}` cannot trigger further expansion.

use crate::config::SynapseConfig;
use crate::error::SynapseError;
use crate::vault::Vault;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

pub const VAR_MAX_RESPONSE_LENGTH: &str = "maxResponseLength";
pub const VAR_MODEL: &str = "model";
pub const VAR_DATE: &str = "date";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Date format used for every `{{date}}` substitution and note footer.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Variable bindings for one render call. Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    vars: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context holding the built-ins every prompt may reference.
    pub fn builtins(config: &SynapseConfig, today: NaiveDate) -> Self {
        let mut ctx = Self::new();
        ctx.insert(
            VAR_MAX_RESPONSE_LENGTH,
            config.max_response_length.to_string(),
        );
        ctx.insert(VAR_MODEL, config.model_name.clone());
        ctx.insert(VAR_DATE, today.format(DATE_FORMAT).to_string());
        ctx
    }

    /// Built-ins plus the user-defined variables from the settings record.
    pub fn for_prompts(config: &SynapseConfig, today: NaiveDate) -> Self {
        let mut ctx = Self::builtins(config, today);
        ctx.extend_custom(&config.custom_template_variables);
        ctx
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds user variables. Keys already bound are kept as they are.
    pub fn extend_custom(&mut self, custom: &BTreeMap<String, String>) {
        for (key, value) in custom {
            if self.vars.contains_key(key) {
                debug!(variable = %key, "Custom template variable shadows a built-in; ignored");
                continue;
            }
            self.vars.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Replace every `{{key}}` bound in `context`, left to right, in one pass.
pub fn render(text: &str, context: &TemplateContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let Some(end) = after_open.find(CLOSE) else {
            // No closing braces anywhere further on: nothing left to substitute.
            out.push_str(&rest[start..]);
            return out;
        };

        match context.get(&after_open[..end]) {
            Some(value) => {
                out.push_str(value);
                rest = &after_open[end + CLOSE.len()..];
            }
            None => {
                // Emit the braces literally and resume right after them so a
                // later `{{` inside this span still gets its chance.
                out.push_str(OPEN);
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Reads template notes from the vault and renders them.
pub struct TemplateProcessor<'a> {
    vault: &'a dyn Vault,
}

impl<'a> TemplateProcessor<'a> {
    pub fn new(vault: &'a dyn Vault) -> Self {
        Self { vault }
    }

    /// Render the template stored at `template_path`.
    ///
    /// A missing template file is a `Template` error; unbound variables inside
    /// the template are left as written.
    pub fn process(
        &self,
        template_path: &str,
        context: &TemplateContext,
    ) -> Result<String, SynapseError> {
        let text = match self.vault.read(template_path) {
            Ok(text) => text,
            Err(SynapseError::NotFound(_)) => {
                return Err(SynapseError::Template(format!(
                    "Template file not found: {}",
                    template_path
                )))
            }
            Err(e) => return Err(SynapseError::Template(e.to_string())),
        };
        debug!(template = %template_path, variables = context.len(), "Rendering note template");
        Ok(render(&text, context))
    }

    pub fn exists(&self, template_path: &str) -> bool {
        self.vault.exists(template_path)
    }

    /// Markdown notes whose path mentions `template` or `Template`.
    pub fn list_templates(&self) -> Result<Vec<String>, SynapseError> {
        let mut templates: Vec<String> = self
            .vault
            .list_markdown()?
            .into_iter()
            .filter(|path| path.contains("template") || path.contains("Template"))
            .collect();
        templates.sort();
        Ok(templates)
    }
}
