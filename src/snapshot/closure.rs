//! Per-target import closure.
//!
//! Entry-folder files seed a worklist. Each imported module is expanded once:
//! a registered product contributes its whole file set without being walked
//! further, otherwise repo-local folders named after the module are pulled in
//! and walked in turn.

use std::collections::BTreeSet;

use super::imports::ImportIndex;
use super::manifest::ModuleFileSet;
use super::{is_under, FileKind, Owner, RepoFile, TargetSnapshot, TargetSpec};
use crate::report::{Warning, Warnings};

/// Resolves closures against one scan.
pub struct ClosureResolver<'a> {
    modules: &'a ModuleFileSet,
    imports: &'a ImportIndex,
    /// Repo-owned files that may enter a closure, sorted by path.
    local: Vec<&'a RepoFile>,
}

impl<'a> ClosureResolver<'a> {
    /// Builds a resolver. With `membership`, repo-owned sources outside the
    /// compiled set are never seeded or pulled in.
    #[must_use]
    pub fn new(
        files: &'a [RepoFile],
        modules: &'a ModuleFileSet,
        imports: &'a ImportIndex,
        membership: Option<&BTreeSet<String>>,
    ) -> Self {
        let local = files
            .iter()
            .filter(|f| *f.owner() == Owner::Repo)
            .filter(|f| match f.kind() {
                FileKind::Source => membership.map_or(true, |m| m.contains(f.path())),
                FileKind::Resource => true,
                FileKind::Test | FileKind::Other => false,
            })
            .collect();
        Self { modules, imports, local }
    }

    /// Closure of one target, sorted by path.
    pub fn resolve(&self, target: &TargetSpec, warnings: &mut Warnings) -> TargetSnapshot {
        let mut closure: BTreeSet<RepoFile> = BTreeSet::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut expanded: BTreeSet<&str> = BTreeSet::new();

        let mut worklist: Vec<&RepoFile> = self.local_under(&target.entry_folder).collect();
        closure.extend(worklist.iter().map(|f| (*f).clone()));

        while let Some(file) = worklist.pop() {
            if !visited.insert(file.path()) {
                continue;
            }
            for module in self.imports.imports_of(file.path()) {
                if !expanded.insert(module) {
                    continue;
                }
                if let Some(files) = self.modules.get(module) {
                    closure.extend(files.iter().cloned());
                    continue;
                }

                let candidates = self.local_candidates(module, &target.entry_folder);
                if candidates.is_empty() {
                    warnings.push(Warning::UnresolvedModule {
                        target: target.name.clone(),
                        module: module.to_string(),
                    });
                    continue;
                }
                for candidate in candidates {
                    closure.insert(candidate.clone());
                    if !visited.contains(candidate.path()) {
                        worklist.push(candidate);
                    }
                }
            }
        }

        log::debug!("{}: closure has {} files", target.name, closure.len());
        TargetSnapshot { name: target.name.clone(), files: closure.into_iter().collect() }
    }

    fn local_under<'s>(&'s self, prefix: &'s str) -> impl Iterator<Item = &'a RepoFile> + 's {
        self.local.iter().copied().filter(move |f| is_under(f.path(), prefix))
    }

    /// Repo files under `<module>/`, `Sources/<module>/` or `<entry>/<module>/`.
    fn local_candidates(&self, module: &str, entry_folder: &str) -> BTreeSet<&'a RepoFile> {
        let mut prefixes = vec![module.to_string(), format!("Sources/{module}")];
        if !entry_folder.is_empty() {
            prefixes.push(format!("{entry_folder}/{module}"));
        }
        prefixes.iter().flat_map(|prefix| self.local_under(prefix)).collect()
    }
}
