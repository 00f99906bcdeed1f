//! Approval rules keyed by company.

use std::collections::HashMap;
use std::path::Path;

use claimflow_shared::{ApprovalConfig, ApprovalRuleId, CompanyId};
use serde::Deserialize;
use tracing::info;

use crate::approval::error::ApprovalError;
use crate::approval::rule::ApprovalRule;

/// On-disk shape of a rules file.
#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<ApprovalRule>,
}

/// Validated approval rules grouped by company.
///
/// Within a company, rules keep insertion order; the first active one is
/// the company's rule.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: HashMap<CompanyId, Vec<ApprovalRule>>,
}

impl RuleBook {
    /// Creates an empty rulebook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the rules file named by the configuration, if any.
    ///
    /// # Errors
    ///
    /// See [`RuleBook::load`].
    pub fn from_config(config: &ApprovalConfig) -> Result<Self, ApprovalError> {
        match &config.rules_file {
            Some(path) => Self::load(path),
            None => Ok(Self::new()),
        }
    }

    /// Loads rules from a TOML, JSON or YAML file with a top-level `rules` list.
    ///
    /// # Errors
    ///
    /// * `RulesFile` if the file cannot be read or parsed
    /// * `InvalidRule` if any rule fails validation
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ApprovalError> {
        let path = path.as_ref();
        let file: RulesFile = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| ApprovalError::RulesFile(format!("{}: {e}", path.display())))?;

        let mut book = Self::new();
        for rule in file.rules {
            book.insert(rule)?;
        }

        info!(path = %path.display(), rules = book.len(), "Approval rules loaded");
        Ok(book)
    }

    /// Adds a rule, replacing any rule with the same ID.
    ///
    /// # Errors
    ///
    /// `InvalidRule` if the rule fails validation; the book is unchanged.
    pub fn insert(&mut self, rule: ApprovalRule) -> Result<(), ApprovalError> {
        rule.validate()?;

        let company_rules = self.rules.entry(rule.company_id).or_default();
        if let Some(existing) = company_rules.iter_mut().find(|r| r.id == rule.id) {
            *existing = rule;
            return Ok(());
        }

        // The same ID may have moved between companies.
        let (id, company_id) = (rule.id, rule.company_id);
        company_rules.push(rule);
        for (company, rules) in &mut self.rules {
            if *company != company_id {
                rules.retain(|r| r.id != id);
            }
        }
        self.rules.retain(|_, rules| !rules.is_empty());
        Ok(())
    }

    /// Removes a rule by ID.
    pub fn remove(&mut self, rule_id: ApprovalRuleId) -> Option<ApprovalRule> {
        let mut removed = None;
        for rules in self.rules.values_mut() {
            if let Some(pos) = rules.iter().position(|r| r.id == rule_id) {
                removed = Some(rules.remove(pos));
                break;
            }
        }
        self.rules.retain(|_, rules| !rules.is_empty());
        removed
    }

    /// The rule governing new expenses of a company.
    ///
    /// # Errors
    ///
    /// `NoActiveRule` if the company has no active rule.
    pub fn active_rule(&self, company_id: CompanyId) -> Result<&ApprovalRule, ApprovalError> {
        self.rules_for(company_id)
            .iter()
            .find(|r| r.active)
            .ok_or(ApprovalError::NoActiveRule(company_id))
    }

    /// All rules of a company, active or not.
    #[must_use]
    pub fn rules_for(&self, company_id: CompanyId) -> &[ApprovalRule] {
        self.rules
            .get(&company_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    /// Returns true if the book holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
