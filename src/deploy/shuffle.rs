//! Shuffle group resolution
//!
//! Entries sharing a shuffle group compete for a single slot per deployment.
//! The previous winner of a group sits out the draw whenever the group has
//! another candidate, so consecutive deployments rotate through the group.

use crate::addons::AddonEntry;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Shuffle group name -> chosen add-on name
pub type ShuffleChoices = BTreeMap<String, String>;

/// Outcome of resolving a set of entries for deployment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Archives to deploy: ungrouped entries in input order, then one pick
    /// per group in order of the group's first appearance
    pub included: Vec<PathBuf>,

    /// Names of the included entries, parallel to `included`
    pub included_names: Vec<String>,

    /// One choice per shuffle group seen in this resolution
    pub choices: ShuffleChoices,
}

/// Pick the archives to deploy.
///
/// Disabled entries are dropped, ungrouped entries are always included and
/// each shuffle group contributes one uniformly drawn member, appended after
/// the ungrouped entries. Given a fixed `rng` the result is deterministic.
pub fn resolve<'a, I, R>(entries: I, previous: &ShuffleChoices, rng: &mut R) -> Resolution
where
    I: IntoIterator<Item = &'a AddonEntry>,
    R: Rng + ?Sized,
{
    let enabled: Vec<&AddonEntry> = entries.into_iter().filter(|e| e.is_enabled()).collect();

    let mut group_index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    let mut resolution = Resolution::default();

    for (idx, entry) in enabled.iter().enumerate() {
        match entry.shuffle_group() {
            None => resolution.include(entry),
            Some(group) => {
                let slot = *group_index.entry(group).or_insert_with(|| {
                    groups.push((group, Vec::new()));
                    groups.len() - 1
                });
                groups[slot].1.push(idx);
            }
        }
    }

    for (group, mut candidates) in groups {
        if candidates.len() >= 2 {
            if let Some(prev) = previous.get(group) {
                candidates.retain(|&idx| enabled[idx].name != *prev);
            }
        }

        let pick = enabled[candidates[rng.gen_range(0..candidates.len())]];
        tracing::debug!("Shuffle group '{}' -> {}", group, pick.name);
        resolution.choices.insert(group.to_string(), pick.name.clone());
        resolution.include(pick);
    }

    resolution
}

impl Resolution {
    fn include(&mut self, entry: &AddonEntry) {
        self.included.push(entry.archive_path.clone());
        self.included_names.push(entry.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addons::AddonMetadata;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entry(name: &str, group: Option<&str>, enabled: Option<bool>) -> AddonEntry {
        AddonEntry {
            name: name.to_string(),
            archive_path: PathBuf::from(format!("/w/{name}.vpk")),
            manifest_path: None,
            metadata: AddonMetadata {
                enabled,
                shuffle_group: group.map(str::to_string),
                ..Default::default()
            },
        }
    }

    #[test]
    fn no_enabled_entries_yields_nothing() {
        let entries = vec![entry("a", None, Some(false)), entry("b", Some("x"), Some(false))];
        let mut rng = StdRng::seed_from_u64(1);

        let resolution = resolve(&entries, &ShuffleChoices::new(), &mut rng);
        assert!(resolution.included.is_empty());
        assert!(resolution.choices.is_empty());

        let empty: Vec<AddonEntry> = Vec::new();
        assert_eq!(resolve(&empty, &ShuffleChoices::new(), &mut rng), Resolution::default());
    }

    #[test]
    fn ungrouped_entries_are_always_included_in_order() {
        let entries = vec![
            entry("a", None, None),
            entry("b", None, Some(true)),
            entry("c", None, Some(false)),
        ];
        let resolution = resolve(&entries, &ShuffleChoices::new(), &mut StdRng::seed_from_u64(3));
        assert_eq!(resolution.included_names, vec!["a", "b"]);
        assert_eq!(
            resolution.included,
            vec![PathBuf::from("/w/a.vpk"), PathBuf::from("/w/b.vpk")]
        );
    }

    #[test]
    fn group_picks_follow_ungrouped_entries() {
        let entries = vec![
            entry("alpha", Some("x"), None),
            entry("gamma", None, None),
            entry("solo", Some("y"), None),
            entry("delta", None, None),
        ];
        let resolution = resolve(&entries, &ShuffleChoices::new(), &mut StdRng::seed_from_u64(2));
        assert_eq!(resolution.included_names, vec!["gamma", "delta", "alpha", "solo"]);
        assert_eq!(resolution.included[0], PathBuf::from("/w/gamma.vpk"));
    }

    #[test]
    fn single_member_group_ignores_previous_choice() {
        let entries = vec![entry("solo", Some("x"), None)];
        let mut previous = ShuffleChoices::new();
        previous.insert("x".into(), "solo".into());

        for seed in 0..20 {
            let resolution = resolve(&entries, &previous, &mut StdRng::seed_from_u64(seed));
            assert_eq!(resolution.included_names, vec!["solo"]);
            assert_eq!(resolution.choices.get("x").map(String::as_str), Some("solo"));
        }
    }

    #[test]
    fn two_member_group_alternates() {
        let entries = vec![entry("alpha", Some("x"), None), entry("beta", Some("x"), None)];

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let first = resolve(&entries, &ShuffleChoices::new(), &mut rng);
            let second = resolve(&entries, &first.choices, &mut rng);
            let third = resolve(&entries, &second.choices, &mut rng);

            assert_ne!(first.choices["x"], second.choices["x"]);
            assert_ne!(second.choices["x"], third.choices["x"]);
            assert_eq!(second.included_names.len(), 1);
        }
    }

    #[test]
    fn larger_group_never_repeats_previous_pick() {
        let entries = vec![
            entry("a", Some("x"), None),
            entry("b", Some("x"), None),
            entry("c", Some("x"), None),
        ];
        let mut rng = StdRng::seed_from_u64(42);
        let mut previous = ShuffleChoices::new();
        for _ in 0..50 {
            let resolution = resolve(&entries, &previous, &mut rng);
            if let Some(prev) = previous.get("x") {
                assert_ne!(&resolution.choices["x"], prev);
            }
            previous = resolution.choices;
        }
    }

    #[test]
    fn disabled_members_do_not_compete() {
        let entries = vec![
            entry("a", Some("x"), Some(false)),
            entry("b", Some("x"), None),
        ];
        let mut previous = ShuffleChoices::new();
        previous.insert("x".into(), "b".into());

        let resolution = resolve(&entries, &previous, &mut StdRng::seed_from_u64(9));
        assert_eq!(resolution.included_names, vec!["b"]);
    }

    #[test]
    fn stale_groups_are_absent_from_new_choices() {
        let entries = vec![entry("a", Some("x"), None), entry("g", None, None)];
        let mut previous = ShuffleChoices::new();
        previous.insert("gone".into(), "old".into());

        let resolution = resolve(&entries, &previous, &mut StdRng::seed_from_u64(5));
        assert_eq!(resolution.choices.len(), 1);
        assert!(resolution.choices.contains_key("x"));
    }

    #[test]
    fn example_scenario_includes_gamma_and_one_of_group() {
        let entries = vec![
            entry("alpha", Some("x"), None),
            entry("beta", Some("x"), None),
            entry("gamma", None, None),
        ];
        let resolution = resolve(&entries, &ShuffleChoices::new(), &mut StdRng::seed_from_u64(7));

        assert_eq!(resolution.included.len(), 2);
        assert!(resolution.included_names.contains(&"gamma".to_string()));
        let pick = &resolution.choices["x"];
        assert!(pick == "alpha" || pick == "beta");
        assert!(resolution.included_names.contains(pick));
    }
}
