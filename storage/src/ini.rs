//! # INI Store
//!
//! Format:
//! - Sections: `[section]`, nesting written as `[parent.child]`
//! - Options: `key = value` or `key: value`
//! - Comments: lines starting with `#` or `;`
//! - Multiline values: each further line indented under its option
//!
//! Sections and keys keep their file order and their case. A literal `%` is
//! stored as `%%` so the file stays compatible with interpolating INI
//! readers; the store itself hands out unescaped values.

use crate::{BackingStore, StoreFormat, encode_error, io_error, parse_error};
use errors::StoreError;
use std::io;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
struct Section {
    name: String,
    options: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: Vec::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn set(&mut self, key: &str, value: &str) {
        match self.options.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.options.push((key.to_string(), value.to_string())),
        }
    }

    fn append_line(&mut self, key: &str, line: &str) {
        if let Some((_, existing)) = self.options.iter_mut().find(|(k, _)| k == key) {
            existing.push('\n');
            existing.push_str(line);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniStore {
    sections: Vec<Section>,
}

impl IniStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse INI text, replacing the current contents.
    pub fn parse(&mut self, text: &str) -> Result<(), StoreError> {
        let mut sections: Vec<Section> = Vec::new();
        let mut current: Option<usize> = None;
        let mut last_key: Option<String> = None;

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();

            if line.starts_with([' ', '\t']) {
                if let (Some(position), Some(key)) = (current, last_key.as_deref()) {
                    sections[position].append_line(key, &unescape(trimmed));
                    continue;
                }
            }

            if trimmed.is_empty() {
                last_key = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if let Some(name) = trimmed
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                let name = name.trim();
                let position = match sections.iter().position(|s| s.name == name) {
                    Some(position) => position,
                    None => {
                        sections.push(Section::new(name));
                        sections.len() - 1
                    }
                };
                current = Some(position);
                last_key = None;
                continue;
            }

            let Some((key, value)) = split_option(trimmed) else {
                return Err(parse_error(
                    StoreFormat::Ini,
                    format!("line {}: expected `key = value`, got {trimmed:?}", index + 1),
                ));
            };
            let Some(position) = current else {
                return Err(parse_error(
                    StoreFormat::Ini,
                    format!("line {}: option {key:?} outside of any section", index + 1),
                ));
            };
            sections[position].set(key, &unescape(value));
            last_key = Some(key.to_string());
        }

        // Whitespace-only continuation lines at the end of a value are padding.
        for section in &mut sections {
            for (_, value) in &mut section.options {
                value.truncate(value.trim_end_matches('\n').len());
            }
        }

        self.sections = sections;
        Ok(())
    }

    /// Names of all sections, in file order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Serialized INI text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&format!("[{}]\n", section.name));
            for (key, value) in &section.options {
                out.push_str(&format!("{key} = {}\n", escape(value).replace('\n', "\n\t")));
            }
            out.push('\n');
        }
        out
    }
}

/// Split at the first `=` or `:`.
fn split_option(line: &str) -> Option<(&str, &str)> {
    let position = line.find(['=', ':'])?;
    let key = line[..position].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[position + 1..].trim()))
}

fn escape(value: &str) -> String {
    value.replace('%', "%%")
}

fn unescape(value: &str) -> String {
    value.replace("%%", "%")
}

impl BackingStore for IniStore {
    fn format(&self) -> StoreFormat {
        StoreFormat::Ini
    }

    fn read(&mut self, path: &Path) -> Result<(), StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "INI file does not exist yet, starting empty");
            self.sections.clear();
            return Ok(());
        }
        let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        self.parse(&text)
    }

    fn write(&self, out: &mut dyn io::Write) -> Result<(), StoreError> {
        out.write_all(self.render().as_bytes())
            .map_err(|e| encode_error(StoreFormat::Ini, e))
    }

    fn has_section(&self, section: &str) -> bool {
        self.section(section).is_some()
    }

    fn add_section(&mut self, section: &str) -> Result<(), StoreError> {
        if !self.has_section(section) {
            self.sections.push(Section::new(section));
        }
        Ok(())
    }

    fn has_option(&self, section: &str, key: &str) -> bool {
        self.section(section)
            .is_some_and(|s| s.get(key).is_some())
    }

    fn remove_option(&mut self, section: &str, key: &str) -> Result<bool, StoreError> {
        let Some(section) = self.section_mut(section) else {
            return Ok(false);
        };
        let before = section.options.len();
        section.options.retain(|(k, _)| k != key);
        Ok(section.options.len() != before)
    }

    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.section(section)
            .and_then(|s| s.get(key))
            .map(str::to_string)
    }

    fn set(&mut self, section: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.add_section(section)?;
        if let Some(section) = self.section_mut(section) {
            section.set(key, value);
        }
        Ok(())
    }
}
