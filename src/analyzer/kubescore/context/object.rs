//! Canonical shapes for every resource kind kube-score understands.
//!
//! Each versioned schema of a kind decodes into the same shape here: only the
//! fields the checks read are modelled and unknown fields are ignored, so
//! `apps/v1beta2` and `apps/v1` Deployments become the same `Deployment`.
//! The `type_meta` of every object is filled in from the probed document
//! after decoding.

use super::meta::{IntOrString, LabelSelector, ObjectMeta, Quantity, TypeMeta, scalar_map};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Pods and containers
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodTemplateSpec {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodSpec {
    pub containers: Vec<Container>,
    pub init_containers: Vec<Container>,
    pub affinity: Option<Affinity>,
    pub topology_spread_constraints: Option<Vec<TopologySpreadConstraint>>,
    pub security_context: Option<PodSecurityContext>,
}

impl PodSpec {
    /// Init containers followed by regular containers.
    pub fn all_containers(&self) -> impl Iterator<Item = &Container> {
        self.init_containers.iter().chain(self.containers.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: String,
    pub image_pull_policy: String,
    pub resources: ResourceRequirements,
    pub liveness_probe: Option<Probe>,
    pub readiness_probe: Option<Probe>,
    pub env: Vec<EnvVar>,
    pub ports: Vec<ContainerPort>,
    pub security_context: Option<SecurityContext>,
}

impl Container {
    /// The image tag, or an empty string when the image has none. Images
    /// pinned by digest return the digest.
    pub fn image_tag(&self) -> &str {
        // A registry port ("host:5000/app") is not a tag.
        let last_segment = self.image.rsplit('/').next().unwrap_or("");
        if let Some((_, digest)) = last_segment.split_once('@') {
            return digest;
        }
        match last_segment.rsplit_once(':') {
            Some((_, tag)) => tag,
            None => "",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceRequirements {
    pub limits: BTreeMap<String, Quantity>,
    pub requests: BTreeMap<String, Quantity>,
}

impl ResourceRequirements {
    /// A missing or zero limit counts as unset.
    pub fn has_limit(&self, resource: &str) -> bool {
        self.limits.get(resource).is_some_and(|q| !q.is_zero())
    }

    pub fn has_request(&self, resource: &str) -> bool {
        self.requests.get(resource).is_some_and(|q| !q.is_zero())
    }

    /// Whether request and limit of `resource` are the same amount.
    /// Two unset values are equal.
    pub fn request_equals_limit(&self, resource: &str) -> bool {
        match (self.requests.get(resource), self.limits.get(resource)) {
            (Some(request), Some(limit)) => request.same_as(limit),
            (None, None) => true,
            (Some(q), None) | (None, Some(q)) => q.is_zero(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Probe {
    #[serde(flatten)]
    pub handler: ProbeHandler,
    pub initial_delay_seconds: Option<i32>,
    pub period_seconds: Option<i32>,
    pub timeout_seconds: Option<i32>,
    pub success_threshold: Option<i32>,
    pub failure_threshold: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbeHandler {
    pub exec: Option<ExecAction>,
    pub http_get: Option<HttpGetAction>,
    pub tcp_socket: Option<TcpSocketAction>,
    pub grpc: Option<GrpcAction>,
}

impl ProbeHandler {
    /// Whether both handlers probe the same endpoint in the same way.
    pub fn targets_same_as(&self, other: &ProbeHandler) -> bool {
        if let (Some(a), Some(b)) = (&self.http_get, &other.http_get) {
            if a.path == b.path && a.port == b.port {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (&self.tcp_socket, &other.tcp_socket) {
            if a.port == b.port {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (&self.exec, &other.exec) {
            if a.command == b.command {
                return true;
            }
        }
        if let (Some(a), Some(b)) = (&self.grpc, &other.grpc) {
            if a == b {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecAction {
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpGetAction {
    pub path: String,
    pub port: IntOrString,
    pub host: String,
    pub scheme: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpSocketAction {
    pub port: IntOrString,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrpcAction {
    pub port: i32,
    pub service: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerPort {
    pub name: String,
    pub container_port: i32,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityContext {
    pub privileged: Option<bool>,
    pub read_only_root_filesystem: Option<bool>,
    pub run_as_user: Option<i64>,
    pub run_as_group: Option<i64>,
    pub run_as_non_root: Option<bool>,
    pub allow_privilege_escalation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodSecurityContext {
    pub run_as_user: Option<i64>,
    pub run_as_group: Option<i64>,
    pub run_as_non_root: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Affinity {
    pub pod_anti_affinity: Option<PodAntiAffinity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodAntiAffinity {
    pub required_during_scheduling_ignored_during_execution: Vec<PodAffinityTerm>,
    pub preferred_during_scheduling_ignored_during_execution: Vec<WeightedPodAffinityTerm>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodAffinityTerm {
    pub label_selector: Option<LabelSelector>,
    pub topology_key: String,
    pub namespaces: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeightedPodAffinityTerm {
    pub weight: i32,
    pub pod_affinity_term: PodAffinityTerm,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TopologySpreadConstraint {
    pub max_skew: i32,
    pub topology_key: String,
    pub when_unsatisfiable: String,
    pub label_selector: Option<LabelSelector>,
    pub min_domains: Option<i32>,
}

// ============================================================================
// Workloads
// ============================================================================

/// A bare Pod. Its metadata and spec are held as a pod template so that it
/// exposes the same view as the controllers that embed one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PodManifest")]
pub struct Pod {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub template: PodTemplateSpec,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PodManifest {
    metadata: ObjectMeta,
    spec: PodSpec,
}

impl From<PodManifest> for Pod {
    fn from(manifest: PodManifest) -> Self {
        Self {
            type_meta: TypeMeta::default(),
            template: PodTemplateSpec {
                metadata: manifest.metadata,
                spec: manifest.spec,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Deployment {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub replicas: Option<i32>,
    pub selector: Option<LabelSelector>,
    pub template: PodTemplateSpec,
    pub strategy: DeploymentStrategy,
    pub revision_history_limit: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeploymentStrategy {
    #[serde(rename = "type")]
    pub strategy_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatefulSet {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: StatefulSetSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatefulSetSpec {
    pub replicas: Option<i32>,
    pub selector: Option<LabelSelector>,
    pub template: PodTemplateSpec,
    pub service_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DaemonSet {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: DaemonSetSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DaemonSetSpec {
    pub selector: Option<LabelSelector>,
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Job {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: JobSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobSpec {
    pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CronJob {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: CronJobSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CronJobSpec {
    pub schedule: String,
    pub starting_deadline_seconds: Option<i64>,
    pub job_template: JobTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobTemplateSpec {
    pub metadata: ObjectMeta,
    pub spec: JobSpec,
}

// ============================================================================
// Networking
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Service {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(deserialize_with = "scalar_map")]
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
    pub external_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServicePort {
    pub name: String,
    pub port: i32,
    pub target_port: Option<IntOrString>,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkPolicy {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: NetworkPolicySpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkPolicySpec {
    pub pod_selector: LabelSelector,
    pub policy_types: Vec<String>,
    pub ingress: Vec<serde_yaml::Value>,
    pub egress: Vec<serde_yaml::Value>,
}

impl NetworkPolicySpec {
    /// Policy types in effect. When none are listed, Ingress is implied and
    /// Egress is added if egress rules are present.
    pub fn effective_policy_types(&self) -> Vec<&str> {
        if !self.policy_types.is_empty() {
            return self.policy_types.iter().map(String::as_str).collect();
        }
        let mut types = vec!["Ingress"];
        if !self.egress.is_empty() {
            types.push("Egress");
        }
        types
    }
}

/// An Ingress in the `networking.k8s.io/v1` shape. Older versions are
/// converted into it when decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Ingress {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: IngressSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngressSpec {
    pub ingress_class_name: Option<String>,
    pub default_backend: Option<IngressBackend>,
    pub rules: Vec<IngressRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngressRule {
    pub host: String,
    pub http: Option<HttpIngressRuleValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpIngressRuleValue {
    pub paths: Vec<HttpIngressPath>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpIngressPath {
    pub path: String,
    pub path_type: String,
    pub backend: IngressBackend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngressBackend {
    pub service: Option<IngressServiceBackend>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngressServiceBackend {
    pub name: String,
    pub port: ServiceBackendPort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceBackendPort {
    pub name: String,
    pub number: i32,
}

// ============================================================================
// Scaling and availability
// ============================================================================

/// The fields kube-score reads are identical across `autoscaling/v1`,
/// `v2beta1`, `v2beta2` and `v2`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HorizontalPodAutoscaler {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: HorizontalPodAutoscalerSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HorizontalPodAutoscalerSpec {
    pub scale_target_ref: CrossVersionObjectReference,
    pub min_replicas: Option<i32>,
    pub max_replicas: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrossVersionObjectReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodDisruptionBudget {
    #[serde(skip)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    pub spec: PodDisruptionBudgetSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodDisruptionBudgetSpec {
    pub min_available: Option<IntOrString>,
    pub max_unavailable: Option<IntOrString>,
    pub selector: Option<LabelSelector>,
}

// ============================================================================
// The object enum
// ============================================================================

/// A decoded Kubernetes object of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum K8sObject {
    Pod(Box<Pod>),
    Job(Box<Job>),
    CronJob(Box<CronJob>),
    Deployment(Box<Deployment>),
    StatefulSet(Box<StatefulSet>),
    DaemonSet(Box<DaemonSet>),
    Service(Box<Service>),
    NetworkPolicy(Box<NetworkPolicy>),
    Ingress(Box<Ingress>),
    HorizontalPodAutoscaler(Box<HorizontalPodAutoscaler>),
    PodDisruptionBudget(Box<PodDisruptionBudget>),
}

impl K8sObject {
    pub fn type_meta(&self) -> &TypeMeta {
        match self {
            Self::Pod(o) => &o.type_meta,
            Self::Job(o) => &o.type_meta,
            Self::CronJob(o) => &o.type_meta,
            Self::Deployment(o) => &o.type_meta,
            Self::StatefulSet(o) => &o.type_meta,
            Self::DaemonSet(o) => &o.type_meta,
            Self::Service(o) => &o.type_meta,
            Self::NetworkPolicy(o) => &o.type_meta,
            Self::Ingress(o) => &o.type_meta,
            Self::HorizontalPodAutoscaler(o) => &o.type_meta,
            Self::PodDisruptionBudget(o) => &o.type_meta,
        }
    }

    pub fn object_meta(&self) -> &ObjectMeta {
        match self {
            Self::Pod(o) => &o.template.metadata,
            Self::Job(o) => &o.metadata,
            Self::CronJob(o) => &o.metadata,
            Self::Deployment(o) => &o.metadata,
            Self::StatefulSet(o) => &o.metadata,
            Self::DaemonSet(o) => &o.metadata,
            Self::Service(o) => &o.metadata,
            Self::NetworkPolicy(o) => &o.metadata,
            Self::Ingress(o) => &o.metadata,
            Self::HorizontalPodAutoscaler(o) => &o.metadata,
            Self::PodDisruptionBudget(o) => &o.metadata,
        }
    }

    pub fn kind(&self) -> &str {
        &self.type_meta().kind
    }

    pub fn name(&self) -> &str {
        &self.object_meta().name
    }

    pub fn namespace(&self) -> &str {
        &self.object_meta().namespace
    }

    /// Set the `apiVersion`/`kind` recorded for this object.
    pub fn set_type_meta(&mut self, type_meta: TypeMeta) {
        let slot = match self {
            Self::Pod(o) => &mut o.type_meta,
            Self::Job(o) => &mut o.type_meta,
            Self::CronJob(o) => &mut o.type_meta,
            Self::Deployment(o) => &mut o.type_meta,
            Self::StatefulSet(o) => &mut o.type_meta,
            Self::DaemonSet(o) => &mut o.type_meta,
            Self::Service(o) => &mut o.type_meta,
            Self::NetworkPolicy(o) => &mut o.type_meta,
            Self::Ingress(o) => &mut o.type_meta,
            Self::HorizontalPodAutoscaler(o) => &mut o.type_meta,
            Self::PodDisruptionBudget(o) => &mut o.type_meta,
        };
        *slot = type_meta;
    }
}
