use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use semver::Version;
use vpm_core::{
    PackageRecord, PackageSource, ProjectState, RepositoryVisibility, UnityVersion,
    CURATED_REPOSITORY_ID, OFFICIAL_REPOSITORY_ID,
};

use crate::compat::{is_unity_compatible, SDK_ROOT_PACKAGES};
use crate::exclusivity::apply_sdk_exclusivity;
use crate::types::{InstalledInfo, PackageLatest, PackageRow};

pub const LOCAL_USER_SOURCE_LABEL: &str = "User";

pub fn reconcile(
    packages: &[PackageRecord],
    project: Option<&ProjectState>,
    visibility: &RepositoryVisibility,
) -> Vec<PackageRow> {
    let hidden: HashSet<&str> = visibility
        .hidden_repositories
        .iter()
        .map(String::as_str)
        .collect();

    let mut yanked_versions: HashSet<(String, Version)> = HashSet::new();
    let mut known_packages: HashSet<String> = HashSet::new();
    let mut user_packages: Vec<&PackageRecord> = Vec::new();
    // buckets keep first-seen repository order for the residual fold below
    let mut per_repository: Vec<(String, Vec<&PackageRecord>)> = Vec::new();

    for pkg in packages {
        if !visibility.show_prerelease_packages && pkg.is_prerelease() {
            continue;
        }
        if pkg.info.is_yanked {
            yanked_versions.insert((pkg.info.name.clone(), pkg.info.version.clone()));
            continue;
        }

        // a package behind a hidden source still counts as known
        known_packages.insert(pkg.info.name.clone());

        match &pkg.source {
            PackageSource::LocalUser => {
                if visibility.hide_local_user_packages {
                    continue;
                }
                user_packages.push(pkg);
            }
            PackageSource::Remote { id, .. } => {
                if hidden.contains(id.as_str()) {
                    continue;
                }
                match per_repository.iter_mut().find(|(repo, _)| repo == id) {
                    Some((_, bucket)) => bucket.push(pkg),
                    None => per_repository.push((id.clone(), vec![pkg])),
                }
            }
        }
    }

    let project_unity = project.and_then(|p| p.unity);
    let mut table: BTreeMap<String, PackageRow> = BTreeMap::new();

    // Fold precedence only decides which source gets to describe a version
    // first: the two built-in repositories, then local user packages, then
    // declared repositories in caller order, then anything left over.
    for pkg in take_bucket(&mut per_repository, OFFICIAL_REPOSITORY_ID) {
        add_record(&mut table, pkg, project_unity);
    }
    for pkg in take_bucket(&mut per_repository, CURATED_REPOSITORY_ID) {
        add_record(&mut table, pkg, project_unity);
    }
    for &pkg in &user_packages {
        add_record(&mut table, pkg, project_unity);
    }
    for repository in &visibility.user_repositories {
        for pkg in take_bucket(&mut per_repository, &repository.id) {
            add_record(&mut table, pkg, project_unity);
        }
    }
    for (_, bucket) in per_repository {
        for pkg in bucket {
            add_record(&mut table, pkg, project_unity);
        }
    }

    for row in table.values_mut() {
        let best = row.best_compatible().cloned();
        if let Some(best) = best {
            row.latest = PackageLatest::Contains(best);
        }
    }

    if let Some(project) = project {
        for (_, info) in &project.installed_packages {
            let row = table
                .entry(info.name.clone())
                .or_insert_with(|| PackageRow::new(info));

            // the installed record wins for display name; its aliases are
            // prepended instead of replacing the catalog ones
            row.display_name = info.display_name_or_id().to_string();
            let mut aliases = info.aliases.clone();
            aliases.append(&mut row.aliases);
            row.aliases = aliases;

            row.installed = Some(InstalledInfo {
                version: info.version.clone(),
                yanked: info.is_yanked
                    || yanked_versions.contains(&(info.name.clone(), info.version.clone())),
            });
            row.is_there_source = known_packages.contains(&info.name);

            let best = row.latest.record().cloned();
            if let Some(best) = best {
                if info.version < best.info.version {
                    row.latest = PackageLatest::Upgradable(best);
                }
            }
        }
    }

    apply_sdk_exclusivity(&mut table);

    let mut rows: Vec<PackageRow> = table.into_values().collect();
    rows.sort_by_key(|row| row.installed.is_none());
    rows
}

fn take_bucket<'a>(
    buckets: &mut Vec<(String, Vec<&'a PackageRecord>)>,
    id: &str,
) -> Vec<&'a PackageRecord> {
    match buckets.iter().position(|(repo, _)| repo == id) {
        Some(position) => buckets.remove(position).1,
        None => Vec::new(),
    }
}

fn add_record(
    table: &mut BTreeMap<String, PackageRow>,
    pkg: &PackageRecord,
    unity: Option<UnityVersion>,
) {
    let row = table
        .entry(pkg.info.name.clone())
        .or_insert_with(|| PackageRow::new(&pkg.info));
    row.is_there_source = true;

    if pkg.info.version > row.info_source {
        // display metadata follows the highest version folded so far
        row.info_source = pkg.info.version.clone();
        row.display_name = pkg.info.display_name_or_id().to_string();
        row.aliases = pkg.info.aliases.clone();
    }

    let key = Reverse(pkg.info.version.clone());
    if is_unity_compatible(pkg, unity) {
        row.unity_compatible.insert(key, pkg.clone());
    } else {
        row.unity_incompatible.insert(key, pkg.clone());
    }

    match &pkg.source {
        PackageSource::LocalUser => {
            row.sources.insert(LOCAL_USER_SOURCE_LABEL.to_string());
        }
        PackageSource::Remote { display_name, .. } => {
            row.sources.insert(display_name.clone());
        }
    }
}

pub fn filter_rows<'a>(rows: &'a [PackageRow], query: &str) -> Vec<&'a PackageRow> {
    if query.is_empty() {
        return rows.iter().collect();
    }
    let query = query.to_lowercase();
    rows.iter().filter(|row| row.matches_query(&query)).collect()
}

// A Unity 2019 project with an SDK root installed is a candidate for the
// 2022 migration flow.
pub fn migration_recommended(project: &ProjectState) -> bool {
    let Some(unity) = project.unity else {
        return false;
    };
    if unity.major != 2019 {
        return false;
    }
    project
        .installed_packages
        .iter()
        .any(|(id, _)| SDK_ROOT_PACKAGES.contains(&id.as_str()))
}
