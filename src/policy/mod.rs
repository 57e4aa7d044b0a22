//! Override rule store
//!
//! Holds the parsed user policy: mask/unmask rules, keyword, license and
//! property acceptance rules, and USE forcing rules, each an atom plus a
//! token payload. A rule whose atom carries no `::repo` constraint
//! applies to matching instances from every repository; a constrained
//! atom narrows the rule to that repository alone.
//!
//! Textual rule lines follow the `atom [token ...]` form:
//!
//! ```text
//! dev-libs/A::repo1 foo
//! =dev-libs/C-1::test-repo
//! dev-libs/F::repo1 -bar
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::atom::Atom;
use crate::error::{Error, Result};

/// Whether a mask-sequence entry masks or unmasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskAction {
    Mask,
    Unmask,
}

/// One entry of the ordered mask/unmask sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskRule {
    pub action: MaskAction,
    pub atom: Atom,
}

/// One keyword/license/property/USE override rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub atom: Atom,
    /// Payload tokens; meaning depends on the rule kind.
    pub tokens: Vec<String>,
}

/// The full override policy for one resolution snapshot
///
/// Rules are kept in declaration order per kind; the mask and unmask
/// files share a single ordered sequence so that the last matching
/// entry decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideConfig {
    arch: String,
    accept_keywords: Vec<String>,
    accept_licenses: Vec<String>,
    accept_properties: Vec<String>,
    profile_masks: Vec<Atom>,
    mask_rules: Vec<MaskRule>,
    keyword_rules: Vec<OverrideRule>,
    license_rules: Vec<OverrideRule>,
    property_rules: Vec<OverrideRule>,
    use_rules: Vec<OverrideRule>,
}

impl OverrideConfig {
    /// Baseline policy for an architecture: stable keywords of that
    /// arch, all licenses, all properties.
    pub fn new(arch: impl Into<String>) -> Self {
        let arch = arch.into();
        Self {
            accept_keywords: vec![arch.clone()],
            accept_licenses: vec!["*".to_string()],
            accept_properties: vec!["*".to_string()],
            arch,
            profile_masks: Vec::new(),
            mask_rules: Vec::new(),
            keyword_rules: Vec::new(),
            license_rules: Vec::new(),
            property_rules: Vec::new(),
            use_rules: Vec::new(),
        }
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Replace the baseline accepted-keyword tokens.
    pub fn set_accept_keywords(&mut self, tokens: Vec<String>) {
        self.accept_keywords = tokens;
    }

    /// Replace the baseline accepted-license tokens.
    pub fn set_accept_licenses(&mut self, tokens: Vec<String>) {
        self.accept_licenses = tokens;
    }

    /// Replace the baseline accepted-property tokens.
    pub fn set_accept_properties(&mut self, tokens: Vec<String>) {
        self.accept_properties = tokens;
    }

    pub fn accept_keywords(&self) -> &[String] {
        &self.accept_keywords
    }

    pub fn accept_licenses(&self) -> &[String] {
        &self.accept_licenses
    }

    pub fn accept_properties(&self) -> &[String] {
        &self.accept_properties
    }

    /// Baseline mask from profile metadata; applied before (and
    /// overridable by) the user mask/unmask sequence.
    pub fn add_profile_mask(&mut self, atom: Atom) {
        self.profile_masks.push(atom);
    }

    pub fn add_mask(&mut self, atom: Atom) {
        self.mask_rules.push(MaskRule {
            action: MaskAction::Mask,
            atom,
        });
    }

    pub fn add_unmask(&mut self, atom: Atom) {
        self.mask_rules.push(MaskRule {
            action: MaskAction::Unmask,
            atom,
        });
    }

    /// Accept extra keyword tokens for matching instances. An empty
    /// payload accepts the testing keyword of the configured arch.
    pub fn add_keywords(&mut self, atom: Atom, mut tokens: Vec<String>) {
        if tokens.is_empty() {
            tokens.push(format!("~{}", self.arch));
        }
        self.keyword_rules.push(OverrideRule { atom, tokens });
    }

    /// Accept extra license tokens for matching instances.
    pub fn add_license(&mut self, atom: Atom, tokens: Vec<String>) {
        self.license_rules.push(OverrideRule { atom, tokens });
    }

    /// Edit the accepted-property set for matching instances; a `-`
    /// prefix removes a token.
    pub fn add_properties(&mut self, atom: Atom, tokens: Vec<String>) {
        self.property_rules.push(OverrideRule { atom, tokens });
    }

    /// Force USE flags for matching instances; a `-` prefix disables.
    pub fn add_use(&mut self, atom: Atom, tokens: Vec<String>) {
        self.use_rules.push(OverrideRule { atom, tokens });
    }

    pub fn profile_masks(&self) -> &[Atom] {
        &self.profile_masks
    }

    pub fn mask_rules(&self) -> &[MaskRule] {
        &self.mask_rules
    }

    pub fn keyword_rules(&self) -> &[OverrideRule] {
        &self.keyword_rules
    }

    pub fn license_rules(&self) -> &[OverrideRule] {
        &self.license_rules
    }

    pub fn property_rules(&self) -> &[OverrideRule] {
        &self.property_rules
    }

    pub fn use_rules(&self) -> &[OverrideRule] {
        &self.use_rules
    }

    // Line parsers for the textual rule forms.

    /// Parse one mask line (a bare atom).
    pub fn add_mask_line(&mut self, line: &str) -> Result<()> {
        self.add_mask(parse_bare_atom(line)?);
        Ok(())
    }

    /// Parse one unmask line (a bare atom).
    pub fn add_unmask_line(&mut self, line: &str) -> Result<()> {
        self.add_unmask(parse_bare_atom(line)?);
        Ok(())
    }

    /// Parse one keywords line: `atom [keyword ...]`.
    pub fn add_keywords_line(&mut self, line: &str) -> Result<()> {
        let (atom, tokens) = parse_rule_line(line)?;
        self.add_keywords(atom, tokens);
        Ok(())
    }

    /// Parse one license line: `atom license [license ...]`.
    pub fn add_license_line(&mut self, line: &str) -> Result<()> {
        let (atom, tokens) = parse_rule_line(line)?;
        self.add_license(atom, tokens);
        Ok(())
    }

    /// Parse one properties line: `atom [-]property [...]`.
    pub fn add_properties_line(&mut self, line: &str) -> Result<()> {
        let (atom, tokens) = parse_rule_line(line)?;
        self.add_properties(atom, tokens);
        Ok(())
    }

    /// Parse one USE line: `atom [-]flag [...]`.
    pub fn add_use_line(&mut self, line: &str) -> Result<()> {
        let (atom, tokens) = parse_rule_line(line)?;
        self.add_use(atom, tokens);
        Ok(())
    }

    /// Parse a whole mask file; invalid entries are skipped with a
    /// warning rather than failing the load.
    pub fn parse_mask_file(&mut self, content: &str) {
        for line in rule_lines(content) {
            if let Err(e) = self.add_mask_line(line) {
                warn!("invalid mask entry '{}': {}", line, e);
            }
        }
    }

    pub fn parse_unmask_file(&mut self, content: &str) {
        for line in rule_lines(content) {
            if let Err(e) = self.add_unmask_line(line) {
                warn!("invalid unmask entry '{}': {}", line, e);
            }
        }
    }

    pub fn parse_keywords_file(&mut self, content: &str) {
        for line in rule_lines(content) {
            if let Err(e) = self.add_keywords_line(line) {
                warn!("invalid keywords entry '{}': {}", line, e);
            }
        }
    }

    pub fn parse_license_file(&mut self, content: &str) {
        for line in rule_lines(content) {
            if let Err(e) = self.add_license_line(line) {
                warn!("invalid license entry '{}': {}", line, e);
            }
        }
    }

    pub fn parse_properties_file(&mut self, content: &str) {
        for line in rule_lines(content) {
            if let Err(e) = self.add_properties_line(line) {
                warn!("invalid properties entry '{}': {}", line, e);
            }
        }
    }

    pub fn parse_use_file(&mut self, content: &str) {
        for line in rule_lines(content) {
            if let Err(e) = self.add_use_line(line) {
                warn!("invalid use entry '{}': {}", line, e);
            }
        }
    }
}

fn rule_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn parse_bare_atom(line: &str) -> Result<Atom> {
    let line = line.trim();
    if line.split_whitespace().count() != 1 {
        return Err(Error::MalformedAtom(line.to_string()));
    }
    Atom::parse(line)
}

fn parse_rule_line(line: &str) -> Result<(Atom, Vec<String>)> {
    let mut parts = line.split_whitespace();
    let atom = Atom::parse(parts.next().ok_or_else(|| {
        Error::MalformedAtom(line.to_string())
    })?)?;
    Ok((atom, parts.map(str::to_string).collect()))
}
