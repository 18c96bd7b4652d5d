//! Ingress backends must point at an existing Service port.

use crate::analyzer::kubescore::checks::ScoreContext;
use crate::analyzer::kubescore::context::{Ingress, IngressServiceBackend, Service};
use crate::analyzer::kubescore::types::{Grade, TestScore};

pub fn ingress_targets_service(ingress: &Ingress, ctx: &ScoreContext<'_>) -> anyhow::Result<TestScore> {
    let mut score = TestScore::new(Grade::AllOk);

    let paths = ingress
        .spec
        .rules
        .iter()
        .filter_map(|rule| rule.http.as_ref())
        .flat_map(|http| http.paths.iter());

    for path in paths {
        // Resource backends have no Service to look for.
        let Some(backend) = &path.backend.service else {
            continue;
        };

        let found = ctx
            .objects
            .services()
            .filter(|svc| svc.metadata.namespace == ingress.metadata.namespace)
            .any(|svc| backend_matches(svc, backend));

        if !found {
            score.grade = Grade::Critical;
            score.add_comment(
                &path.path,
                "No service match was found",
                format!(
                    "No service with name {} and port {} was found",
                    backend.name, backend.port.number
                ),
            );
        }
    }
    Ok(score)
}

fn backend_matches(service: &Service, backend: &IngressServiceBackend) -> bool {
    if service.metadata.name != backend.name {
        return false;
    }
    let wanted = &backend.port;
    service.spec.ports.iter().any(|port| {
        (wanted.number > 0 && port.port == wanted.number) || (!wanted.name.is_empty() && port.name == wanted.name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::config::RunConfiguration;
    use crate::analyzer::kubescore::context::K8sObject;
    use crate::analyzer::kubescore::rules::tests::{find, parse};

    const SERVICE: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: prod
spec:
  selector:
    app: web
  ports:
    - name: http
      port: 80
---
"#;

    fn run(yaml: &str) -> TestScore {
        let objects = parse(yaml);
        let config = RunConfiguration::default();
        let ctx = ScoreContext { objects: &objects, config: &config };
        let ingress = find(&objects, |o| match o {
            K8sObject::Ingress(i) => Some(i.as_ref()),
            _ => None,
        });
        ingress_targets_service(ingress, &ctx).unwrap()
    }

    #[test]
    fn test_v1_backend_by_number_and_name() {
        let yaml = SERVICE.to_string()
            + r#"apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
  namespace: prod
spec:
  rules:
    - http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: web
                port:
                  number: 80
          - path: /named
            pathType: Prefix
            backend:
              service:
                name: web
                port:
                  name: http
"#;
        let score = run(&yaml);
        assert_eq!(score.grade, Grade::AllOk, "{:?}", score.comments);
    }

    #[test]
    fn test_legacy_backend_with_wrong_port() {
        let yaml = SERVICE.to_string()
            + r#"apiVersion: extensions/v1beta1
kind: Ingress
metadata:
  name: web
  namespace: prod
spec:
  rules:
    - http:
        paths:
          - path: /api
            backend:
              serviceName: web
              servicePort: 8080
"#;
        let score = run(&yaml);
        assert_eq!(score.grade, Grade::Critical);
        assert_eq!(score.comments[0].path, "/api");
        assert_eq!(score.comments[0].summary, "No service match was found");
        assert_eq!(
            score.comments[0].description,
            "No service with name web and port 8080 was found"
        );
    }

    #[test]
    fn test_service_in_other_namespace_does_not_match() {
        let yaml = SERVICE.to_string()
            + r#"apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
spec:
  rules:
    - http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: web
                port:
                  number: 80
"#;
        assert_eq!(run(&yaml).grade, Grade::Critical);
    }
}
