//! The decoder registration table.
//!
//! Each supported `(apiVersion, kind)` pair maps to a function that decodes
//! the raw document into its canonical shape. Versions of a kind whose
//! fields the checks read identically share one decoder; older Ingress
//! versions go through an adapter into the `networking.k8s.io/v1` shape.

use crate::analyzer::kubescore::context::{
    CronJob, DaemonSet, Deployment, HorizontalPodAutoscaler, HttpIngressPath, HttpIngressRuleValue, Ingress,
    IngressBackend, IngressRule, IngressServiceBackend, IngressSpec, IntOrString, Job, K8sObject, NetworkPolicy,
    ObjectMeta, Pod, PodDisruptionBudget, Service, ServiceBackendPort, StatefulSet, TypeMeta,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Decodes one raw YAML document into a canonical object.
pub type DecodeFn = fn(&str) -> Result<K8sObject, serde_yaml::Error>;

/// Maps `(apiVersion, kind)` to the decoder for that schema.
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<(String, String), DecodeFn>,
}

impl DecoderRegistry {
    /// An empty registry. Every document decodes as unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in kind and version.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register("v1", "Pod", decode_pod);
        registry.register("batch/v1", "Job", decode_job);
        for version in ["batch/v1beta1", "batch/v1"] {
            registry.register(version, "CronJob", decode_cronjob);
        }
        for version in ["apps/v1", "apps/v1beta1", "apps/v1beta2", "extensions/v1beta1"] {
            registry.register(version, "Deployment", decode_deployment);
        }
        for version in ["apps/v1", "apps/v1beta1", "apps/v1beta2"] {
            registry.register(version, "StatefulSet", decode_statefulset);
        }
        for version in ["apps/v1", "apps/v1beta2", "extensions/v1beta1"] {
            registry.register(version, "DaemonSet", decode_daemonset);
        }
        registry.register("v1", "Service", decode_service);
        registry.register("networking.k8s.io/v1", "NetworkPolicy", decode_network_policy);
        registry.register("networking.k8s.io/v1", "Ingress", decode_ingress);
        for version in ["extensions/v1beta1", "networking.k8s.io/v1beta1"] {
            registry.register(version, "Ingress", decode_legacy_ingress);
        }
        for version in ["policy/v1beta1", "policy/v1"] {
            registry.register(version, "PodDisruptionBudget", decode_pdb);
        }
        for version in [
            "autoscaling/v1",
            "autoscaling/v2beta1",
            "autoscaling/v2beta2",
            "autoscaling/v2",
        ] {
            registry.register(version, "HorizontalPodAutoscaler", decode_hpa);
        }

        registry
    }

    /// Add or replace the decoder for a schema.
    pub fn register(&mut self, api_version: &str, kind: &str, decode: DecodeFn) -> &mut Self {
        self.decoders
            .insert((api_version.to_string(), kind.to_string()), decode);
        self
    }

    pub fn get(&self, type_meta: &TypeMeta) -> Option<DecodeFn> {
        self.decoders
            .get(&(type_meta.api_version.clone(), type_meta.kind.clone()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

/// The pod template always lives in its owner's namespace.
fn inherit_namespace(owner: &ObjectMeta, template: &mut ObjectMeta) {
    template.namespace = owner.namespace.clone();
}

// ============================================================================
// Decoders
// ============================================================================

fn decode_pod(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    let pod: Pod = serde_yaml::from_str(raw)?;
    Ok(K8sObject::Pod(Box::new(pod)))
}

fn decode_job(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    let mut job: Job = serde_yaml::from_str(raw)?;
    inherit_namespace(&job.metadata, &mut job.spec.template.metadata);
    Ok(K8sObject::Job(Box::new(job)))
}

fn decode_cronjob(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    let mut cronjob: CronJob = serde_yaml::from_str(raw)?;
    let job_template = &mut cronjob.spec.job_template;
    inherit_namespace(&cronjob.metadata, &mut job_template.metadata);
    inherit_namespace(&cronjob.metadata, &mut job_template.spec.template.metadata);
    Ok(K8sObject::CronJob(Box::new(cronjob)))
}

fn decode_deployment(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    let mut deployment: Deployment = serde_yaml::from_str(raw)?;
    inherit_namespace(&deployment.metadata, &mut deployment.spec.template.metadata);
    Ok(K8sObject::Deployment(Box::new(deployment)))
}

fn decode_statefulset(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    let mut statefulset: StatefulSet = serde_yaml::from_str(raw)?;
    inherit_namespace(&statefulset.metadata, &mut statefulset.spec.template.metadata);
    Ok(K8sObject::StatefulSet(Box::new(statefulset)))
}

fn decode_daemonset(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    let mut daemonset: DaemonSet = serde_yaml::from_str(raw)?;
    inherit_namespace(&daemonset.metadata, &mut daemonset.spec.template.metadata);
    Ok(K8sObject::DaemonSet(Box::new(daemonset)))
}

fn decode_service(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    Ok(K8sObject::Service(Box::new(serde_yaml::from_str::<Service>(raw)?)))
}

fn decode_network_policy(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    Ok(K8sObject::NetworkPolicy(Box::new(
        serde_yaml::from_str::<NetworkPolicy>(raw)?,
    )))
}

fn decode_ingress(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    Ok(K8sObject::Ingress(Box::new(serde_yaml::from_str::<Ingress>(raw)?)))
}

fn decode_pdb(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    Ok(K8sObject::PodDisruptionBudget(Box::new(
        serde_yaml::from_str::<PodDisruptionBudget>(raw)?,
    )))
}

fn decode_hpa(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    Ok(K8sObject::HorizontalPodAutoscaler(Box::new(
        serde_yaml::from_str::<HorizontalPodAutoscaler>(raw)?,
    )))
}

// ============================================================================
// Legacy Ingress
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyIngress {
    metadata: ObjectMeta,
    spec: LegacyIngressSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyIngressSpec {
    ingress_class_name: Option<String>,
    backend: Option<LegacyBackend>,
    rules: Vec<LegacyIngressRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyIngressRule {
    host: String,
    http: Option<LegacyHttpRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyHttpRule {
    paths: Vec<LegacyHttpPath>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyHttpPath {
    path: String,
    path_type: String,
    backend: LegacyBackend,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyBackend {
    service_name: String,
    service_port: Option<IntOrString>,
}

impl From<LegacyBackend> for IngressBackend {
    fn from(legacy: LegacyBackend) -> Self {
        if legacy.service_name.is_empty() {
            return IngressBackend::default();
        }
        let port = match legacy.service_port {
            Some(IntOrString::Int(number)) => ServiceBackendPort {
                number,
                ..Default::default()
            },
            Some(IntOrString::String(name)) => match name.trim().parse::<i32>() {
                Ok(number) => ServiceBackendPort {
                    number,
                    ..Default::default()
                },
                Err(_) => ServiceBackendPort {
                    name,
                    ..Default::default()
                },
            },
            None => ServiceBackendPort::default(),
        };
        IngressBackend {
            service: Some(IngressServiceBackend {
                name: legacy.service_name,
                port,
            }),
        }
    }
}

impl From<LegacyIngress> for Ingress {
    fn from(legacy: LegacyIngress) -> Self {
        let rules = legacy
            .spec
            .rules
            .into_iter()
            .map(|rule| IngressRule {
                host: rule.host,
                http: rule.http.map(|http| HttpIngressRuleValue {
                    paths: http
                        .paths
                        .into_iter()
                        .map(|p| HttpIngressPath {
                            path: p.path,
                            path_type: p.path_type,
                            backend: p.backend.into(),
                        })
                        .collect(),
                }),
            })
            .collect();

        Ingress {
            type_meta: TypeMeta::default(),
            metadata: legacy.metadata,
            spec: IngressSpec {
                ingress_class_name: legacy.spec.ingress_class_name,
                default_backend: legacy.spec.backend.map(IngressBackend::from),
                rules,
            },
        }
    }
}

fn decode_legacy_ingress(raw: &str) -> Result<K8sObject, serde_yaml::Error> {
    let legacy: LegacyIngress = serde_yaml::from_str(raw)?;
    Ok(K8sObject::Ingress(Box::new(legacy.into())))
}
