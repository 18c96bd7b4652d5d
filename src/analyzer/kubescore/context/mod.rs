//! The parsed input set and the facet views checks are written against.
//!
//! A [`Resource`] pairs a decoded [`K8sObject`] with its [`FileLocation`].
//! [`ParsedObjects`] holds every resource of one run plus the documents that
//! were recognised but not supported, and gives checks typed access to the
//! kinds they correlate against (services, pod templates, policies...).

pub mod meta;
pub mod object;

use std::collections::BTreeMap;

pub use meta::{
    IntOrString, LabelSelector, LabelSelectorError, LabelSelectorRequirement, ObjectMeta, Quantity, TypeMeta,
    selector_map_matches,
};
pub use object::*;

use crate::analyzer::kubescore::types::{Facet, FileLocation};

// ============================================================================
// Facet traits
// ============================================================================

/// Anything that carries a pod template: bare pods and every workload kind.
pub trait PodSpecer: Send + Sync {
    fn type_meta(&self) -> &TypeMeta;

    /// Metadata of the owning object.
    fn object_meta(&self) -> &ObjectMeta;

    fn pod_template(&self) -> &PodTemplateSpec;

    fn pod_spec(&self) -> &PodSpec {
        &self.pod_template().spec
    }
}

/// A replicated controller. Rules that apply equally to Deployments and
/// StatefulSets are written once against this trait.
pub trait Workload: PodSpecer {
    fn replicas(&self) -> Option<i32>;

    fn selector(&self) -> Option<&LabelSelector>;

    /// Lowercase kind used in messages ("deployment").
    fn kind_word(&self) -> &'static str;
}

impl PodSpecer for Pod {
    fn type_meta(&self) -> &TypeMeta {
        &self.type_meta
    }

    fn object_meta(&self) -> &ObjectMeta {
        &self.template.metadata
    }

    fn pod_template(&self) -> &PodTemplateSpec {
        &self.template
    }
}

macro_rules! impl_pod_specer {
    ($kind:ty, |$obj:ident| $template:expr) => {
        impl PodSpecer for $kind {
            fn type_meta(&self) -> &TypeMeta {
                &self.type_meta
            }

            fn object_meta(&self) -> &ObjectMeta {
                &self.metadata
            }

            fn pod_template(&self) -> &PodTemplateSpec {
                let $obj = self;
                $template
            }
        }
    };
}

impl_pod_specer!(Deployment, |d| &d.spec.template);
impl_pod_specer!(StatefulSet, |s| &s.spec.template);
impl_pod_specer!(DaemonSet, |d| &d.spec.template);
impl_pod_specer!(Job, |j| &j.spec.template);
impl_pod_specer!(CronJob, |c| &c.spec.job_template.spec.template);

impl Workload for Deployment {
    fn replicas(&self) -> Option<i32> {
        self.spec.replicas
    }

    fn selector(&self) -> Option<&LabelSelector> {
        self.spec.selector.as_ref()
    }

    fn kind_word(&self) -> &'static str {
        "deployment"
    }
}

impl Workload for StatefulSet {
    fn replicas(&self) -> Option<i32> {
        self.spec.replicas
    }

    fn selector(&self) -> Option<&LabelSelector> {
        self.spec.selector.as_ref()
    }

    fn kind_word(&self) -> &'static str {
        "statefulset"
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A decoded object and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub location: FileLocation,
    pub k8s_object: K8sObject,
}

impl Resource {
    pub fn new(location: FileLocation, k8s_object: K8sObject) -> Self {
        Self { location, k8s_object }
    }

    pub fn type_meta(&self) -> &TypeMeta {
        self.k8s_object.type_meta()
    }

    pub fn object_meta(&self) -> &ObjectMeta {
        self.k8s_object.object_meta()
    }

    /// The pod template view, for pods and workloads.
    pub fn as_pod_specer(&self) -> Option<&dyn PodSpecer> {
        match &self.k8s_object {
            K8sObject::Pod(o) => Some(o.as_ref()),
            K8sObject::Job(o) => Some(o.as_ref()),
            K8sObject::CronJob(o) => Some(o.as_ref()),
            K8sObject::Deployment(o) => Some(o.as_ref()),
            K8sObject::StatefulSet(o) => Some(o.as_ref()),
            K8sObject::DaemonSet(o) => Some(o.as_ref()),
            _ => None,
        }
    }

    /// Annotations of the embedded pod template, if there is one.
    pub fn child_annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.as_pod_specer()
            .map(|p| &p.pod_template().metadata.annotations)
    }

    /// Every facet this resource exposes, in execution order.
    pub fn facets(&self) -> Vec<Facet> {
        let mut facets = vec![Facet::Meta];
        if self.as_pod_specer().is_some() {
            facets.push(Facet::PodTemplate);
        }
        let own = match &self.k8s_object {
            K8sObject::Service(_) => Some(Facet::Service),
            K8sObject::Deployment(_) => Some(Facet::Deployment),
            K8sObject::StatefulSet(_) => Some(Facet::StatefulSet),
            K8sObject::NetworkPolicy(_) => Some(Facet::NetworkPolicy),
            K8sObject::Ingress(_) => Some(Facet::Ingress),
            K8sObject::CronJob(_) => Some(Facet::CronJob),
            K8sObject::HorizontalPodAutoscaler(_) => Some(Facet::HorizontalPodAutoscaler),
            K8sObject::PodDisruptionBudget(_) => Some(Facet::PodDisruptionBudget),
            K8sObject::Pod(_) | K8sObject::Job(_) | K8sObject::DaemonSet(_) => None,
        };
        facets.extend(own);
        facets
    }
}

/// A document with a recognised `apiVersion`/`kind` that no decoder handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredObject {
    pub type_meta: TypeMeta,
    pub location: FileLocation,
}

/// Everything one run parsed, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedObjects {
    resources: Vec<Resource>,
    ignored: Vec<IgnoredObject>,
}

impl ParsedObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn add_ignored(&mut self, ignored: IgnoredObject) {
        self.ignored.push(ignored);
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn ignored(&self) -> &[IgnoredObject] {
        &self.ignored
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.resources.iter().filter_map(|r| match &r.k8s_object {
            K8sObject::Service(s) => Some(s.as_ref()),
            _ => None,
        })
    }

    pub fn pod_specers(&self) -> impl Iterator<Item = &dyn PodSpecer> {
        self.resources.iter().filter_map(Resource::as_pod_specer)
    }

    pub fn network_policies(&self) -> impl Iterator<Item = &NetworkPolicy> {
        self.resources.iter().filter_map(|r| match &r.k8s_object {
            K8sObject::NetworkPolicy(n) => Some(n.as_ref()),
            _ => None,
        })
    }

    pub fn hpas(&self) -> impl Iterator<Item = &HorizontalPodAutoscaler> {
        self.resources.iter().filter_map(|r| match &r.k8s_object {
            K8sObject::HorizontalPodAutoscaler(h) => Some(h.as_ref()),
            _ => None,
        })
    }

    pub fn pdbs(&self) -> impl Iterator<Item = &PodDisruptionBudget> {
        self.resources.iter().filter_map(|r| match &r.k8s_object {
            K8sObject::PodDisruptionBudget(p) => Some(p.as_ref()),
            _ => None,
        })
    }

    /// Whether a Service in the same namespace selects the pod template.
    pub fn is_targeted_by_service(&self, pod: &dyn PodSpecer) -> bool {
        let template = pod.pod_template();
        self.services().any(|svc| {
            svc.metadata.namespace == template.metadata.namespace
                && selector_map_matches(&svc.spec.selector, &template.metadata.labels)
        })
    }

    /// Whether an HPA in the same namespace scales the named object.
    pub fn has_matching_hpa(&self, type_meta: &TypeMeta, meta: &ObjectMeta) -> bool {
        self.hpas().any(|hpa| {
            let target = &hpa.spec.scale_target_ref;
            hpa.metadata.namespace == meta.namespace
                && target.kind == type_meta.kind
                && target.name == meta.name
                && target.api_version == type_meta.api_version
        })
    }
}

impl FromIterator<Resource> for ParsedObjects {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
            ignored: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(namespace: &str, labels: &[(&str, &str)]) -> Resource {
        let mut d = Deployment {
            type_meta: TypeMeta::new("apps/v1", "Deployment"),
            ..Default::default()
        };
        d.metadata.name = "web".to_string();
        d.metadata.namespace = namespace.to_string();
        d.spec.template.metadata.namespace = namespace.to_string();
        d.spec.template.metadata.labels = labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Resource::new(FileLocation::new("test.yaml", 1), K8sObject::Deployment(Box::new(d)))
    }

    fn service(namespace: &str, selector: &[(&str, &str)]) -> Resource {
        let mut s = Service {
            type_meta: TypeMeta::new("v1", "Service"),
            ..Default::default()
        };
        s.metadata.name = "web".to_string();
        s.metadata.namespace = namespace.to_string();
        s.spec.selector = selector.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Resource::new(FileLocation::new("test.yaml", 10), K8sObject::Service(Box::new(s)))
    }

    #[test]
    fn test_facets_of_deployment() {
        let d = deployment("", &[]);
        assert_eq!(d.facets(), vec![Facet::Meta, Facet::PodTemplate, Facet::Deployment]);
    }

    #[test]
    fn test_facets_of_service() {
        let s = service("", &[]);
        assert_eq!(s.facets(), vec![Facet::Meta, Facet::Service]);
        assert!(s.as_pod_specer().is_none());
    }

    #[test]
    fn test_service_targeting_requires_namespace_and_selector() {
        let objects: ParsedObjects = vec![deployment("prod", &[("app", "web")]), service("prod", &[("app", "web")])]
            .into_iter()
            .collect();
        let pod = objects.pod_specers().next().unwrap();
        assert!(objects.is_targeted_by_service(pod));

        let other_ns: ParsedObjects = vec![deployment("prod", &[("app", "web")]), service("dev", &[("app", "web")])]
            .into_iter()
            .collect();
        let pod = other_ns.pod_specers().next().unwrap();
        assert!(!other_ns.is_targeted_by_service(pod));

        let empty_selector: ParsedObjects = vec![deployment("prod", &[("app", "web")]), service("prod", &[])]
            .into_iter()
            .collect();
        let pod = empty_selector.pod_specers().next().unwrap();
        assert!(!empty_selector.is_targeted_by_service(pod));
    }

    #[test]
    fn test_accessors_filter_by_kind() {
        let objects: ParsedObjects = vec![deployment("", &[]), service("", &[])].into_iter().collect();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects.services().count(), 1);
        assert_eq!(objects.pod_specers().count(), 1);
        assert_eq!(objects.hpas().count(), 0);
    }
}
