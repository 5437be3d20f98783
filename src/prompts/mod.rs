// src/prompts/mod.rs
//! Prompt templates. Placeholders are written `{name}` and filled by
//! [`PromptTemplate::render`]; JSON braces inside a template body are fine
//! as long as they do not spell a declared variable.

use anyhow::Result;

pub mod applicant_analyze;
pub mod company_culture_analyze;
pub mod company_data_collect;
pub mod culture_compare;

#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub version: &'static str,
    pub system: &'static str,
    pub human: &'static str,
    pub input_variables: &'static [&'static str],
    /// Schema file (without extension) injected as `{output_schema}`
    pub schema_file: &'static str,
}

impl PromptTemplate {
    /// Fill the human message. Every declared variable must be supplied and
    /// nothing else may be passed.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String> {
        for (key, _) in vars {
            if !self.input_variables.iter().any(|variable| variable == key) {
                anyhow::bail!("Prompt '{}' has no input variable '{}'", self.name, key);
            }
        }

        for variable in self.input_variables {
            if !vars.iter().any(|(key, _)| key == variable) {
                anyhow::bail!("Prompt '{}' is missing input '{}'", self.name, variable);
            }
        }

        // single pass, so substituted values are never scanned again
        let mut rendered = String::with_capacity(self.human.len());
        let mut rest = self.human;
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = tail.find('}').and_then(|close| {
                let key = &tail[1..close];
                vars.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, value)| (*value, close))
            });
            match value {
                Some((value, close)) => {
                    rendered.push_str(value);
                    rest = &tail[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = &tail[1..];
                }
            }
        }
        rendered.push_str(rest);

        Ok(rendered)
    }
}

pub fn all() -> [&'static PromptTemplate; 4] {
    [
        &company_data_collect::PROMPT,
        &company_culture_analyze::PROMPT,
        &applicant_analyze::PROMPT,
        &culture_compare::PROMPT,
    ]
}
