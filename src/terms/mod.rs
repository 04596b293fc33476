// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Category terms over a tagged-object store. Terms are created on first
//! use during assignment; names are unique case-insensitively and a
//! URL-safe slug is derived from each name. Assignment is a full replace
//! of the object's term set.

use crate::errors::DomainError;
use crate::util::yaml_store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

const STORE_LABEL: &str = "terms";
pub const SUGGEST_HARD_CAP: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTerm {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub count: u64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct TermFile {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    terms: BTreeMap<u64, CategoryTerm>,
    /// object id → term ids borne by the object.
    #[serde(default)]
    assignments: BTreeMap<u64, Vec<u64>>,
}

/// Lowercase, non-alphanumeric runs collapsed to single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn store_error(err: impl std::fmt::Display) -> DomainError {
    DomainError::upstream(format!("Term store error: {}", err))
}

pub struct TermStore {
    file: PathBuf,
    state: RwLock<TermFile>,
}

impl TermStore {
    pub fn open(file: PathBuf) -> Result<Self, DomainError> {
        let mut state: TermFile = yaml_store::read_yaml_file(&file, STORE_LABEL)
            .map_err(store_error)?
            .unwrap_or_default();
        let high_water = state.terms.keys().next_back().copied().unwrap_or(0);
        state.next_id = state.next_id.max(high_water + 1).max(1);
        Ok(Self {
            file,
            state: RwLock::new(state),
        })
    }

    fn snapshot(&self) -> Result<TermFile, DomainError> {
        self.state
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| DomainError::upstream("Term store lock poisoned"))
    }

    fn commit<T>(
        &self,
        apply: impl FnOnce(&mut TermFile) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut next = self.snapshot()?;
        let result = apply(&mut next)?;
        yaml_store::write_yaml_file(&self.file, STORE_LABEL, &next).map_err(store_error)?;
        let mut guard = self
            .state
            .write()
            .map_err(|_| DomainError::upstream("Term store lock poisoned"))?;
        *guard = next;
        Ok(result)
    }

    /// Case-insensitive substring search over term names, most-used first,
    /// name ascending as the tie-break, capped at `min(limit, 30)`.
    pub fn suggest(&self, query: &str, limit: usize) -> Result<Vec<CategoryTerm>, DomainError> {
        let needle = query.trim().to_lowercase();
        let state = self.snapshot()?;
        let mut matches: Vec<CategoryTerm> = state
            .terms
            .values()
            .filter(|term| needle.is_empty() || term.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        matches.truncate(limit.min(SUGGEST_HARD_CAP));
        Ok(matches)
    }

    /// Terms currently assigned to an object, name ascending.
    pub fn list_for_object(&self, object_id: u64) -> Result<Vec<CategoryTerm>, DomainError> {
        let state = self.snapshot()?;
        let assigned = state.assignments.get(&object_id).cloned().unwrap_or_default();
        let mut terms: Vec<CategoryTerm> = assigned
            .iter()
            .filter_map(|id| state.terms.get(id).cloned())
            .collect();
        terms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(terms)
    }

    /// Full-replace assignment: normalize names (trim, collapse
    /// case-insensitive duplicates), reuse existing terms case-insensitively
    /// or create missing ones, then set the object's term set to exactly the
    /// resolved ids. Usage counts are recomputed from the assignment table.
    pub fn assign_to_object(
        &self,
        object_id: u64,
        names: &[String],
    ) -> Result<Vec<CategoryTerm>, DomainError> {
        let mut normalized: Vec<String> = Vec::new();
        for name in names {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !normalized
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(trimmed))
            {
                normalized.push(trimmed.to_string());
            }
        }

        self.commit(move |state| {
            let mut resolved = Vec::new();
            for name in &normalized {
                let existing = state
                    .terms
                    .values()
                    .find(|term| term.name.eq_ignore_ascii_case(name))
                    .map(|term| term.id);
                let id = match existing {
                    Some(id) => id,
                    None => {
                        let id = state.next_id;
                        state.next_id += 1;
                        let slug = unique_slug(&state.terms, name, id);
                        state.terms.insert(
                            id,
                            CategoryTerm {
                                id,
                                name: name.clone(),
                                slug,
                                count: 0,
                            },
                        );
                        log::debug!("Created category term '{}' ({})", name, id);
                        id
                    }
                };
                resolved.push(id);
            }

            if resolved.is_empty() {
                state.assignments.remove(&object_id);
            } else {
                state.assignments.insert(object_id, resolved.clone());
            }
            recompute_counts(state);

            let mut terms: Vec<CategoryTerm> = resolved
                .iter()
                .filter_map(|id| state.terms.get(id).cloned())
                .collect();
            terms.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(terms)
        })
    }
}

fn unique_slug(terms: &BTreeMap<u64, CategoryTerm>, name: &str, id: u64) -> String {
    let base = slugify(name);
    let base = if base.is_empty() {
        format!("term-{}", id)
    } else {
        base
    };
    if !terms.values().any(|term| term.slug == base) {
        return base;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !terms.values().any(|term| term.slug == candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn recompute_counts(state: &mut TermFile) {
    for term in state.terms.values_mut() {
        term.count = 0;
    }
    for assigned in state.assignments.values() {
        for id in assigned {
            if let Some(term) = state.terms.get_mut(id) {
                term.count += 1;
            }
        }
    }
}
