//! In-memory settings document and cluster topology.
//!
//! A [`SettingsDocument`] is an ordered list of sections, each holding an
//! ordered list of parameters. Section names and parameter names within a
//! section are unique under case-insensitive comparison; lookups are
//! case-insensitive as well.

pub mod loader;
pub mod topology;

use serde::Serialize;

use crate::error::ManifestError;

pub use loader::{load_manifest, load_manifest_from_str, LoadedManifest};
pub use topology::{
    CertificateRef, Certificates, ClusterManifest, Endpoints, InfrastructureNode, NamedValue,
    NodeType, PortRange,
};

/// A single named setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub is_encrypted: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_encrypted: false,
        }
    }

    pub fn encrypted(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            is_encrypted: true,
        }
    }
}

/// A named group of parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    parameters: Vec<Parameter>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.parameter(name).map(|p| p.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Appends a parameter, rejecting a name already present in this section.
    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<(), ManifestError> {
        if self.contains(&parameter.name) {
            return Err(ManifestError::DuplicateParameter {
                section: self.name.clone(),
                name: parameter.name,
            });
        }
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsDocument {
    sections: Vec<Section>,
}

impl SettingsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn parameter(&self, section: &str, name: &str) -> Option<&Parameter> {
        self.section(section).and_then(|s| s.parameter(name))
    }

    pub fn value(&self, section: &str, name: &str) -> Option<&str> {
        self.parameter(section, name).map(|p| p.value.as_str())
    }

    /// Appends an empty section and returns it for filling in.
    pub fn add_section(&mut self, name: impl Into<String>) -> Result<&mut Section, ManifestError> {
        let name = name.into();
        if self.section(&name).is_some() {
            return Err(ManifestError::DuplicateSection { name });
        }
        self.sections.push(Section::new(name));
        let last = self.sections.len() - 1;
        Ok(&mut self.sections[last])
    }

    /// Appends a fully built section.
    pub fn push_section(&mut self, section: Section) -> Result<(), ManifestError> {
        if self.section(&section.name).is_some() {
            return Err(ManifestError::DuplicateSection { name: section.name });
        }
        self.sections.push(section);
        Ok(())
    }

    /// Sets a parameter, creating the section if needed and replacing an
    /// existing value with the same name.
    pub fn set(&mut self, section: &str, parameter: Parameter) {
        let index = match self
            .sections
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(section))
        {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(section));
                self.sections.len() - 1
            }
        };
        let target = &mut self.sections[index];
        match target
            .parameters
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&parameter.name))
        {
            Some(existing) => *existing = parameter,
            None => target.parameters.push(parameter),
        }
    }

    /// Removes a parameter if present. Returns whether anything was removed.
    pub fn remove(&mut self, section: &str, name: &str) -> bool {
        let Some(target) = self
            .sections
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(section))
        else {
            return false;
        };
        let before = target.parameters.len();
        target.parameters.retain(|p| !p.name.eq_ignore_ascii_case(name));
        before != target.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// ============================================
// Tests
// ============================================
