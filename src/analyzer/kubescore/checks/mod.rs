//! The check registry.
//!
//! A check is a named rule bound to one facet. Its id is derived from the
//! name (lowercased, spaces replaced by hyphens) and must be unique across
//! the registry. Registries are built explicitly and passed to the scoring
//! engine; there is no process-wide table.

pub mod builtin;

use crate::analyzer::kubescore::config::RunConfiguration;
use crate::analyzer::kubescore::context::{
    CronJob, Deployment, HorizontalPodAutoscaler, Ingress, K8sObject, NetworkPolicy, ParsedObjects,
    PodDisruptionBudget, PodSpecer, Resource, Service, StatefulSet,
};
use crate::analyzer::kubescore::types::{Facet, TestScore};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

pub use builtin::register_all;

/// Derive a check id from its name.
pub fn check_id(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Everything a rule may read besides the object it scores.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a> {
    /// All objects of the run, for cross-object correlation.
    pub objects: &'a ParsedObjects,
    pub config: &'a RunConfiguration,
}

/// A rule body for objects of type `T`.
pub type RuleFn<T> = Box<dyn Fn(&T, &ScoreContext<'_>) -> anyhow::Result<TestScore> + Send + Sync>;

/// A rule body for anything carrying a pod template.
pub type PodRuleFn = Box<dyn Fn(&dyn PodSpecer, &ScoreContext<'_>) -> anyhow::Result<TestScore> + Send + Sync>;

/// A rule and the facet it is written against.
pub enum Rule {
    Meta(RuleFn<Resource>),
    PodTemplate(PodRuleFn),
    Service(RuleFn<Service>),
    Deployment(RuleFn<Deployment>),
    StatefulSet(RuleFn<StatefulSet>),
    NetworkPolicy(RuleFn<NetworkPolicy>),
    Ingress(RuleFn<Ingress>),
    CronJob(RuleFn<CronJob>),
    HorizontalPodAutoscaler(RuleFn<HorizontalPodAutoscaler>),
    PodDisruptionBudget(RuleFn<PodDisruptionBudget>),
}

macro_rules! rule_constructor {
    ($fn_name:ident, $variant:ident, $target:ty) => {
        pub fn $fn_name<F>(f: F) -> Self
        where
            F: Fn(&$target, &ScoreContext<'_>) -> anyhow::Result<TestScore> + Send + Sync + 'static,
        {
            Self::$variant(Box::new(f))
        }
    };
}

impl Rule {
    rule_constructor!(meta, Meta, Resource);
    rule_constructor!(service, Service, Service);
    rule_constructor!(deployment, Deployment, Deployment);
    rule_constructor!(statefulset, StatefulSet, StatefulSet);
    rule_constructor!(network_policy, NetworkPolicy, NetworkPolicy);
    rule_constructor!(ingress, Ingress, Ingress);
    rule_constructor!(cronjob, CronJob, CronJob);
    rule_constructor!(hpa, HorizontalPodAutoscaler, HorizontalPodAutoscaler);
    rule_constructor!(pdb, PodDisruptionBudget, PodDisruptionBudget);

    pub fn pod_template<F>(f: F) -> Self
    where
        F: Fn(&dyn PodSpecer, &ScoreContext<'_>) -> anyhow::Result<TestScore> + Send + Sync + 'static,
    {
        Self::PodTemplate(Box::new(f))
    }

    pub fn facet(&self) -> Facet {
        match self {
            Self::Meta(_) => Facet::Meta,
            Self::PodTemplate(_) => Facet::PodTemplate,
            Self::Service(_) => Facet::Service,
            Self::Deployment(_) => Facet::Deployment,
            Self::StatefulSet(_) => Facet::StatefulSet,
            Self::NetworkPolicy(_) => Facet::NetworkPolicy,
            Self::Ingress(_) => Facet::Ingress,
            Self::CronJob(_) => Facet::CronJob,
            Self::HorizontalPodAutoscaler(_) => Facet::HorizontalPodAutoscaler,
            Self::PodDisruptionBudget(_) => Facet::PodDisruptionBudget,
        }
    }

    /// Run the rule, or `None` if the resource does not expose its facet.
    pub fn apply(&self, resource: &Resource, ctx: &ScoreContext<'_>) -> Option<anyhow::Result<TestScore>> {
        match (self, &resource.k8s_object) {
            (Self::Meta(f), _) => Some(f(resource, ctx)),
            (Self::PodTemplate(f), _) => resource.as_pod_specer().map(|pod| f(pod, ctx)),
            (Self::Service(f), K8sObject::Service(o)) => Some(f(o, ctx)),
            (Self::Deployment(f), K8sObject::Deployment(o)) => Some(f(o, ctx)),
            (Self::StatefulSet(f), K8sObject::StatefulSet(o)) => Some(f(o, ctx)),
            (Self::NetworkPolicy(f), K8sObject::NetworkPolicy(o)) => Some(f(o, ctx)),
            (Self::Ingress(f), K8sObject::Ingress(o)) => Some(f(o, ctx)),
            (Self::CronJob(f), K8sObject::CronJob(o)) => Some(f(o, ctx)),
            (Self::HorizontalPodAutoscaler(f), K8sObject::HorizontalPodAutoscaler(o)) => Some(f(o, ctx)),
            (Self::PodDisruptionBudget(f), K8sObject::PodDisruptionBudget(o)) => Some(f(o, ctx)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule({})", self.facet())
    }
}

/// Name, comment and optionality of a check, before it is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSpec {
    pub name: String,
    pub comment: String,
    pub optional: bool,
}

impl CheckSpec {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            optional: false,
        }
    }

    /// Mark the check as disabled unless explicitly enabled.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// The public description of a registered check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInfo {
    pub name: String,
    pub id: String,
    #[serde(rename = "target_type")]
    pub facet: Facet,
    pub comment: String,
    pub optional: bool,
}

/// A registered check.
#[derive(Debug)]
pub struct Check {
    pub info: CheckInfo,
    rule: Rule,
}

impl Check {
    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn facet(&self) -> Facet {
        self.info.facet
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("check id {id:?} of {new:?} is already used by {existing:?}")]
    DuplicateId { id: String, existing: String, new: String },

    #[error("check {0:?} is already registered")]
    DuplicateName(String),
}

/// All checks available to a run, in registration order.
#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: Vec<Check>,
    by_id: HashMap<String, usize>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in check.
    pub fn with_builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        register_all(&mut registry)?;
        Ok(registry)
    }

    /// Register a check. Fails if its derived id is already taken.
    pub fn register(&mut self, spec: CheckSpec, rule: Rule) -> Result<(), RegistryError> {
        let id = check_id(&spec.name);
        if let Some(&index) = self.by_id.get(&id) {
            let existing = &self.checks[index].info.name;
            return Err(if *existing == spec.name {
                RegistryError::DuplicateName(spec.name)
            } else {
                RegistryError::DuplicateId {
                    id,
                    existing: existing.clone(),
                    new: spec.name,
                }
            });
        }

        self.by_id.insert(id.clone(), self.checks.len());
        self.checks.push(Check {
            info: CheckInfo {
                name: spec.name,
                id,
                facet: rule.facet(),
                comment: spec.comment,
                optional: spec.optional,
            },
            rule,
        });
        Ok(())
    }

    pub fn all(&self) -> &[Check] {
        &self.checks
    }

    pub fn all_checks_for(&self, facet: Facet) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(move |c| c.facet() == facet)
    }

    pub fn get(&self, id: &str) -> Option<&Check> {
        self.by_id.get(id).map(|&index| &self.checks[index])
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
