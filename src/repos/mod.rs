//! Repository priority order
//!
//! A total order over repository names used only to break ties between
//! equal-version candidates. The default/unqualified repository is
//! registered like any other so the tie-break stays total; atoms with
//! no `::repo` constraint can still match and select it.

use serde::{Deserialize, Serialize};

/// Ranked repository table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repositories {
    default_repo: String,
    repos: Vec<Repository>,
}

/// One registered repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    /// Higher wins the tie-break.
    pub priority: i64,
}

impl Repositories {
    /// Create a table with the default repository registered at
    /// priority 0.
    pub fn new(default_repo: impl Into<String>) -> Self {
        let default_repo = default_repo.into();
        Self {
            repos: vec![Repository {
                name: default_repo.clone(),
                priority: 0,
            }],
            default_repo,
        }
    }

    /// Register a repository, replacing any previous priority for the
    /// same name.
    pub fn add(&mut self, name: impl Into<String>, priority: i64) {
        let name = name.into();
        match self.repos.iter_mut().find(|r| r.name == name) {
            Some(repo) => repo.priority = priority,
            None => self.repos.push(Repository { name, priority }),
        }
    }

    /// Name of the default/unqualified repository.
    pub fn default_repo(&self) -> &str {
        &self.default_repo
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.repos.iter().any(|r| r.name == name)
    }

    /// Priority of a repository; unregistered names sort below every
    /// registered one.
    pub fn priority_of(&self, name: &str) -> i64 {
        self.repos
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.priority)
            .unwrap_or(i64::MIN)
    }

    /// Registered names, highest priority first.
    pub fn names_by_priority(&self) -> Vec<&str> {
        let mut ranked: Vec<&Repository> = self.repos.iter().collect();
        ranked.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(&b.name)));
        ranked.into_iter().map(|r| r.name.as_str()).collect()
    }
}
