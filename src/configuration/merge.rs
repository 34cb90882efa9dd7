//! Layering one document fragment over another.

use super::PartialConfiguration;
use crate::error::Result;

use indexmap::IndexMap;
use std::hash::Hash;

impl PartialConfiguration {
    /// Overlay `overlay` onto this fragment, returning the combination.
    ///
    /// Each section is handled on its own:
    /// - model: merged with [`Model::merged_with`](crate::model::Model::merged_with)
    ///   when both define one, so the names must match;
    /// - settings: key-wise union, overlay values win and may change kind;
    /// - implementations and resources: union by key, an overlay entry
    ///   replaces the base entry as a whole;
    /// - checkpoints: the overlay's section replaces the base one.
    ///
    /// An absent section never removes anything from the base.
    pub fn merged(&self, overlay: &PartialConfiguration) -> Result<PartialConfiguration> {
        let model = match (&self.model, &overlay.model) {
            (Some(base), Some(over)) => Some(base.merged_with(over)?),
            (base, over) => over.clone().or_else(|| base.clone()),
        };

        let settings = match (&self.settings, &overlay.settings) {
            (Some(base), Some(over)) => {
                let mut merged = base.clone();
                merged.update(over);
                Some(merged)
            }
            (base, over) => over.clone().or_else(|| base.clone()),
        };

        Ok(PartialConfiguration {
            model,
            settings,
            implementations: union(&self.implementations, &overlay.implementations),
            resources: union(&self.resources, &overlay.resources),
            checkpoints: overlay
                .checkpoints
                .clone()
                .or_else(|| self.checkpoints.clone()),
        })
    }

    /// In-place form of [`merged`](Self::merged). On error, `self` is left
    /// unchanged.
    pub fn update(&mut self, overlay: &PartialConfiguration) -> Result<()> {
        *self = self.merged(overlay)?;
        Ok(())
    }
}

fn union<K, V>(base: &Option<IndexMap<K, V>>, overlay: &Option<IndexMap<K, V>>) -> Option<IndexMap<K, V>>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    match (base, overlay) {
        (Some(base), Some(over)) => {
            let mut merged = base.clone();
            for (k, v) in over {
                merged.insert(k.clone(), v.clone());
            }
            Some(merged)
        }
        (base, over) => over.clone().or_else(|| base.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Checkpoints;
    use crate::error::Error;
    use crate::execution::{Implementation, ResourceRequirements};
    use crate::identity::{Identifier, Reference};
    use crate::model::{Component, Model};
    use crate::settings::{SettingValue, Settings};
    use pretty_assertions::assert_eq;

    fn r(s: &str) -> Reference {
        Reference::parse(s).unwrap()
    }

    fn settings(entries: &[(&str, SettingValue)]) -> Settings {
        entries
            .iter()
            .map(|(k, v)| (r(k), v.clone()))
            .collect()
    }

    fn with_settings(entries: &[(&str, SettingValue)]) -> PartialConfiguration {
        PartialConfiguration {
            settings: Some(settings(entries)),
            ..Default::default()
        }
    }

    #[test]
    fn settings_override_and_extend() {
        let base = with_settings(&[("a", 1i64.into())]);
        let overlay = with_settings(&[("a", 2i64.into()), ("b", 3i64.into())]);
        let merged = base.merged(&overlay).unwrap();
        assert_eq!(
            merged.settings,
            Some(settings(&[("a", 2i64.into()), ("b", 3i64.into())]))
        );
    }

    #[test]
    fn merge_is_not_commutative() {
        let a = with_settings(&[("x", 1i64.into())]);
        let b = with_settings(&[("x", 2i64.into())]);
        assert_ne!(a.merged(&b).unwrap(), b.merged(&a).unwrap());
    }

    #[test]
    fn overlay_may_change_setting_kind() {
        let base = with_settings(&[("x", 1i64.into())]);
        let overlay = with_settings(&[("x", "one".into())]);
        let merged = base.merged(&overlay).unwrap();
        assert_eq!(
            merged.settings.unwrap().get(&r("x")),
            Some(&SettingValue::String("one".into()))
        );
    }

    #[test]
    fn absent_sections_keep_base() {
        let mut base = with_settings(&[("x", 1i64.into())]);
        base.set_resources(r("macro"), ResourceRequirements::threaded(4).unwrap());
        let merged = base.merged(&PartialConfiguration::new()).unwrap();
        assert_eq!(merged, base);
    }

    #[test]
    fn implementations_are_replaced_whole() {
        let mut base = PartialConfiguration::new();
        let mut old = Implementation::executable(r("sim"), "/old/sim");
        old.modules = vec!["gcc".into()];
        base.add_implementation(old);
        base.add_implementation(Implementation::executable(r("other"), "/bin/other"));

        let mut overlay = PartialConfiguration::new();
        overlay.add_implementation(Implementation::executable(r("sim"), "/new/sim"));

        let merged = base.merged(&overlay).unwrap();
        let impls = merged.implementations.unwrap();
        let keys: Vec<String> = impls.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["sim", "other"]);
        assert!(impls[&r("sim")].modules.is_empty());
    }

    #[test]
    fn checkpoints_are_replaced_whole() {
        let base = PartialConfiguration {
            checkpoints: Some(Checkpoints {
                at_end: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let replacement = Checkpoints {
            at_end: false,
            wallclock_time: vec![crate::checkpoint::CheckpointRule::at(vec![60.0]).unwrap()],
            simulation_time: vec![],
        };
        let overlay = PartialConfiguration {
            checkpoints: Some(replacement.clone()),
            ..Default::default()
        };
        assert_eq!(base.merged(&overlay).unwrap().checkpoints, Some(replacement));
    }

    #[test]
    fn failed_update_leaves_base_untouched() {
        let model = |name: &str| {
            Model::new(
                Identifier::new(name).unwrap(),
                vec![Component::new(Identifier::new("a").unwrap())],
                vec![],
            )
            .unwrap()
        };
        let mut base = PartialConfiguration {
            model: Some(model("one")),
            ..Default::default()
        };
        let before = base.clone();
        let overlay = PartialConfiguration {
            model: Some(model("two")),
            settings: Some(settings(&[("x", 1i64.into())])),
            ..Default::default()
        };
        assert!(matches!(
            base.update(&overlay),
            Err(Error::IncompatibleModels { .. })
        ));
        assert_eq!(base, before);
    }
}
