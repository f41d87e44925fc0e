use std::collections::{BTreeMap, HashMap, HashSet};

use crate::compat::{AVATARS_SDK_PACKAGE, WORLDS_SDK_PACKAGE};
use crate::types::PackageRow;

// The avatars and worlds SDK roots are mutually exclusive. When the project
// has exactly one of them installed, the other root and everything that
// transitively depends on it disappears from the table.
pub(crate) fn apply_sdk_exclusivity(table: &mut BTreeMap<String, PackageRow>) {
    let avatars_installed = table
        .get(AVATARS_SDK_PACKAGE)
        .is_some_and(|row| row.installed.is_some());
    let worlds_installed = table
        .get(WORLDS_SDK_PACKAGE)
        .is_some_and(|row| row.installed.is_some());
    if avatars_installed == worlds_installed {
        return;
    }

    // dependency name -> rows whose best candidate declares it
    let mut dependants: HashMap<String, HashSet<String>> = HashMap::new();
    for row in table.values() {
        let Some(best) = row.latest.record() else {
            continue;
        };
        for dependency in &best.info.vpm_dependencies {
            dependants
                .entry(dependency.clone())
                .or_default()
                .insert(row.name.clone());
        }
    }

    let seed = if avatars_installed {
        WORLDS_SDK_PACKAGE
    } else {
        AVATARS_SDK_PACKAGE
    };
    let mut worklist = vec![seed.to_string()];
    while let Some(name) = worklist.pop() {
        if table.remove(&name).is_none() {
            // already removed; dependency cycles also end up here
            continue;
        }
        if let Some(names) = dependants.get(&name) {
            worklist.extend(names.iter().cloned());
        }
    }
}
