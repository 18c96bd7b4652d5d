//! Built-in rule bodies, one module per concern.
//!
//! Every rule is a plain function taking the facet it scores and the
//! [`ScoreContext`](crate::analyzer::kubescore::checks::ScoreContext).
//! Rules shared by Deployments and StatefulSets are generic over
//! [`Workload`](crate::analyzer::kubescore::context::Workload).
//! Registration, with names and descriptions, lives in
//! [`checks::builtin`](crate::analyzer::kubescore::checks::builtin).

pub mod container;
pub mod cronjob;
pub mod hpa;
pub mod ingress;
pub mod meta;
pub mod networkpolicy;
pub mod pdb;
pub mod probes;
pub mod security;
pub mod service;
pub mod stable;
pub mod topology;
pub mod workload;
