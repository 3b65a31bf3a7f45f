//! Command hierarchy resolution.
//!
//! An entity that commands itself, or that already has level 1, is a root.
//! Every other entity sits one level below its commander. Levels are
//! propagated pass by pass until a pass assigns nothing.

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::model::EntityStore;

/// Upper bound on propagation passes.
pub const MAX_ITER: usize = 1000;

/// Levels for every entity in store order. `None` means unresolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    levels: IndexMap<String, Option<u32>>,
    passes: usize,
}

impl Hierarchy {
    pub fn level(&self, uid: &str) -> Option<u32> {
        self.levels.get(uid).copied().flatten()
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.levels
            .iter()
            .filter(|(_, level)| level.is_none())
            .map(|(uid, _)| uid.as_str())
    }

    pub fn is_resolved(&self) -> bool {
        self.levels.values().all(Option::is_some)
    }

    /// Number of propagation passes that ran.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

/// Compute command levels without touching the store.
///
/// Entities left unresolved are reported as `UnresolvedCommander` when
/// their commander is set but unknown. Cycles, missing commanders, and
/// commanders already at `u32::MAX` are left for entity preparation to
/// default.
pub fn resolve_levels(store: &EntityStore, diagnostics: &mut Diagnostics) -> Hierarchy {
    let mut levels: IndexMap<String, Option<u32>> = IndexMap::with_capacity(store.len());
    let mut commanders: Vec<Option<&str>> = Vec::with_capacity(store.len());
    for entity in store.entities() {
        let commander = entity.commander.as_deref();
        let level = if commander == Some(entity.uid.as_str()) {
            Some(1)
        } else {
            entity.level
        };
        levels.insert(entity.uid.clone(), level);
        commanders.push(commander);
    }

    let mut passes = 0;
    while passes < MAX_ITER {
        passes += 1;
        let mut assigned = 0;
        for i in 0..levels.len() {
            if levels[i].is_some() {
                continue;
            }
            let Some(commander) = commanders[i] else {
                continue;
            };
            let Some(Some(parent)) = levels.get(commander).copied() else {
                continue;
            };
            match parent.checked_add(1) {
                Some(level) => {
                    levels[i] = Some(level);
                    assigned += 1;
                }
                None => {
                    tracing::debug!(commander, parent, "commander level too deep to extend");
                }
            }
        }
        if assigned == 0 {
            break;
        }
    }

    for (i, (uid, level)) in levels.iter().enumerate() {
        if level.is_some() {
            continue;
        }
        if let Some(commander) = commanders[i] {
            if !store.contains(commander) {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnresolvedCommander,
                        format!("commander {commander} of {uid} is not a known entity"),
                    )
                    .with_entity(uid.as_str()),
                );
            }
        }
    }

    let hierarchy = Hierarchy { levels, passes };
    tracing::debug!(
        passes = hierarchy.passes,
        unresolved = hierarchy.unresolved().count(),
        "resolved command hierarchy"
    );
    hierarchy
}
