// ── Resource pair store ──
//
// Observed and desired composed resources for one pass, keyed by their
// composition-local name. Built from the request, then discarded.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{DesiredResource, ObservedResource, ResourceName};

/// Which side a name is missing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    ObservedOnly,
    DesiredOnly,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ObservedOnly => "observed only",
            Self::DesiredOnly => "desired only",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourcePairs {
    observed: IndexMap<ResourceName, ObservedResource>,
    desired: IndexMap<ResourceName, DesiredResource>,
}

impl ResourcePairs {
    /// Validate both collections. One malformed entry fails the whole set.
    pub fn from_request<O, D>(observed: O, desired: D) -> Result<Self, CoreError>
    where
        O: IntoIterator<Item = (ResourceName, Value)>,
        D: IntoIterator<Item = (ResourceName, Value)>,
    {
        let observed = observed
            .into_iter()
            .map(|(name, value)| {
                let resource = ObservedResource::from_value(value)
                    .map_err(|e| in_collection("observed", &name, &e))?;
                Ok((name, resource))
            })
            .collect::<Result<_, CoreError>>()?;
        let desired = desired
            .into_iter()
            .map(|(name, value)| {
                let resource = DesiredResource::from_value(value)
                    .map_err(|e| in_collection("desired", &name, &e))?;
                Ok((name, resource))
            })
            .collect::<Result<_, CoreError>>()?;

        Ok(Self { observed, desired })
    }

    pub fn observed(&self, name: &ResourceName) -> Option<&ObservedResource> {
        self.observed.get(name)
    }

    pub fn desired(&self, name: &ResourceName) -> Option<&DesiredResource> {
        self.desired.get(name)
    }

    /// Names present on both sides, in desired order.
    pub fn pairs(&self) -> impl Iterator<Item = (&ResourceName, &ObservedResource, &DesiredResource)> {
        self.desired
            .iter()
            .filter_map(|(name, d)| self.observed.get(name).map(|o| (name, o, d)))
    }

    /// Like [`pairs`](Self::pairs), with the desired side writable.
    pub fn pairs_mut(
        &mut self,
    ) -> impl Iterator<Item = (&ResourceName, &ObservedResource, &mut DesiredResource)> {
        let Self { observed, desired } = self;
        let observed = &*observed;
        desired
            .iter_mut()
            .filter_map(move |(name, d)| observed.get(name).map(|o| (name, o, d)))
    }

    /// Names present on one side only. Desired order first, then observed.
    pub fn unpaired(&self) -> Vec<(&ResourceName, Side)> {
        let desired_only = self
            .desired
            .keys()
            .filter(|name| !self.observed.contains_key(*name))
            .map(|name| (name, Side::DesiredOnly));
        let observed_only = self
            .observed
            .keys()
            .filter(|name| !self.desired.contains_key(*name))
            .map(|name| (name, Side::ObservedOnly));
        desired_only.chain(observed_only).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn in_collection(side: &str, name: &ResourceName, err: &CoreError) -> CoreError {
    CoreError::InvalidRequest {
        message: format!("{side} resource {name:?}: {err}", name = name.as_str()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(kind: &str) -> Value {
        json!({ "apiVersion": "projects.gitlab.crossplane.io/v1alpha1", "kind": kind })
    }

    fn named(entries: &[(&str, Value)]) -> Vec<(ResourceName, Value)> {
        entries
            .iter()
            .map(|(n, v)| (ResourceName::from(*n), v.clone()))
            .collect()
    }

    #[test]
    fn pairs_follow_desired_order() {
        let pairs = ResourcePairs::from_request(
            named(&[("a", obj("Project")), ("b", obj("Project"))]),
            named(&[("b", obj("Project")), ("c", obj("Project")), ("a", obj("Project"))]),
        )
        .unwrap();

        let names: Vec<&str> = pairs.pairs().map(|(n, _, _)| n.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn unpaired_reports_both_sides() {
        let pairs = ResourcePairs::from_request(
            named(&[("a", obj("Project")), ("old", obj("Project"))]),
            named(&[("a", obj("Project")), ("new", obj("Project"))]),
        )
        .unwrap();

        let unpaired: Vec<(&str, Side)> = pairs
            .unpaired()
            .into_iter()
            .map(|(n, s)| (n.as_str(), s))
            .collect();
        assert_eq!(
            unpaired,
            [("new", Side::DesiredOnly), ("old", Side::ObservedOnly)]
        );
    }

    #[test]
    fn pairs_mut_writes_through() {
        let mut pairs =
            ResourcePairs::from_request(named(&[("a", obj("Project"))]), named(&[("a", obj("Project"))]))
                .unwrap();
        for (_, _, desired) in pairs.pairs_mut() {
            desired.set_annotation("k", "v").unwrap();
        }
        assert_eq!(
            pairs.desired(&"a".into()).unwrap().annotation("k"),
            Some("v")
        );
    }

    #[test]
    fn malformed_entry_fails_the_set() {
        let err = ResourcePairs::from_request(
            named(&[("a", obj("Project"))]),
            named(&[("a", json!({ "kind": "Project" }))]),
        )
        .unwrap_err();
        match err {
            CoreError::InvalidRequest { message } => {
                assert!(message.contains("desired resource \"a\""), "{message}");
            }
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn empty_collections_are_valid() {
        let pairs = ResourcePairs::from_request(Vec::new(), Vec::new()).unwrap();
        assert!(pairs.is_empty());
        assert!(pairs.unpaired().is_empty());
    }
}
