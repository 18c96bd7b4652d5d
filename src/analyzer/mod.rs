//! # Analyzer Module
//!
//! Static analysis engines. Currently only Kubernetes manifest scoring.

pub mod kubescore;
