use crate::core::{ContainerSpec, WorkloadSpec};
use k8s_openapi::api::core::v1::{Container, Pod};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("admission request missing 'object'")]
    MissingObject,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Extracts the pod carried by an admission request.
pub(crate) fn extract(object: Option<Value>) -> Result<WorkloadSpec, WorkloadError> {
    let mut obj = object.ok_or(WorkloadError::MissingObject)?;
    quantities_as_strings(&mut obj);
    let pod: Pod = serde_json::from_value(obj)?;

    let spec = pod.spec.unwrap_or_default();
    Ok(WorkloadSpec::new(
        spec.containers.into_iter().map(container_spec),
        spec.init_containers
            .into_iter()
            .flatten()
            .map(container_spec),
    ))
}

/// Rewrites numeric container resource quantities (e.g. `"cpu": 2`) as
/// strings, the only form `Quantity` deserializes from.
fn quantities_as_strings(pod: &mut Value) {
    let Some(spec) = pod.get_mut("spec") else {
        return;
    };
    for list in ["containers", "initContainers"] {
        let containers = spec
            .get_mut(list)
            .and_then(Value::as_array_mut)
            .into_iter()
            .flatten();
        for container in containers {
            let Some(resources) = container.get_mut("resources") else {
                continue;
            };
            for field in ["requests", "limits"] {
                let quantities = resources
                    .get_mut(field)
                    .and_then(Value::as_object_mut)
                    .into_iter()
                    .flatten();
                for (_, quantity) in quantities {
                    if quantity.is_number() {
                        *quantity = Value::String(quantity.to_string());
                    }
                }
            }
        }
    }
}

fn container_spec(container: Container) -> ContainerSpec {
    let requests = container
        .resources
        .and_then(|r| r.requests)
        .unwrap_or_default()
        .into_iter()
        .map(|(name, quantity)| (name, quantity.0))
        .collect();
    ContainerSpec::new(container.name, requests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::ContainerKind,
        review::{
            self,
            tests::{pod_json, review_json},
        },
    };
    use maplit::btreemap;
    use serde_json::json;

    fn request(object: Value) -> Option<Value> {
        let body = review_json("default", object);
        review::decode(&serde_json::to_vec(&body).unwrap())
            .expect("must decode")
            .object
    }

    #[test]
    fn extracts_containers_and_init_containers() {
        let req = request(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "trainer" },
            "spec": {
                "initContainers": [{
                    "name": "fetch",
                    "resources": { "requests": { "amd.com/gpu": "1" } },
                }],
                "containers": [
                    { "name": "main", "resources": { "requests": { "cpu": "2", "memory": "4Gi" } } },
                    { "name": "sidecar" },
                ],
            },
        }));

        let workload = extract(req).expect("must extract");
        let containers = workload.containers().collect::<Vec<_>>();
        assert_eq!(containers.len(), 3);

        assert_eq!(containers[0].name, "main");
        assert_eq!(containers[0].kind, ContainerKind::Primary);
        assert_eq!(
            containers[0].requests,
            btreemap! {
                "cpu".to_string() => "2".to_string(),
                "memory".to_string() => "4Gi".to_string(),
            }
        );

        assert_eq!(containers[1].name, "sidecar");
        assert!(containers[1].requests.is_empty());

        assert_eq!(containers[2].name, "fetch");
        assert_eq!(containers[2].kind, ContainerKind::Init);
        assert_eq!(containers[2].resource_names().collect::<Vec<_>>(), vec!["amd.com/gpu"]);
    }

    #[test]
    fn pod_without_containers_is_empty() {
        let req = request(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "empty" },
            "spec": { "containers": [] },
        }));
        assert!(extract(req).expect("must extract").is_empty());

        let req = request(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "no-spec" },
        }));
        assert!(extract(req).expect("must extract").is_empty());
    }

    #[test]
    fn rejects_malformed_pods() {
        let req = request(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "bad" },
            "spec": { "containers": "not-a-list" },
        }));
        assert!(matches!(extract(req), Err(WorkloadError::Json(_))));

        let req = request(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "bad" },
            "spec": { "containers": [{ "name": "main", "resources": { "requests": ["cpu"] } }] },
        }));
        assert!(matches!(extract(req), Err(WorkloadError::Json(_))));

        let req = request(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": "trainer" },
            "spec": { "replicas": 1 },
        }));
        assert!(matches!(extract(req), Err(WorkloadError::Json(_))));

        let req = request(json!("not a pod"));
        assert!(matches!(extract(req), Err(WorkloadError::Json(_))));

        let req = request(json!({ "metadata": { "name": 5 } }));
        assert!(matches!(extract(req), Err(WorkloadError::Json(_))));
    }

    #[test]
    fn accepts_numeric_quantities() {
        let req = request(json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "trainer" },
            "spec": {
                "containers": [{
                    "name": "main",
                    "resources": { "requests": { "cpu": 2, "nvidia.com/gpu": 1 }, "limits": { "cpu": 2.5 } },
                }],
                "initContainers": [{
                    "name": "fetch",
                    "resources": { "requests": { "memory": 1073741824 } },
                }],
            },
        }));

        let workload = extract(req).expect("must extract");
        let containers = workload.containers().collect::<Vec<_>>();
        assert_eq!(
            containers[0].requests,
            btreemap! {
                "cpu".to_string() => "2".to_string(),
                "nvidia.com/gpu".to_string() => "1".to_string(),
            }
        );
        assert_eq!(
            containers[1].requests,
            btreemap! { "memory".to_string() => "1073741824".to_string() }
        );
    }

    #[test]
    fn rejects_missing_object() {
        let mut body = review_json("default", pod_json(json!({})));
        body["request"]
            .as_object_mut()
            .unwrap()
            .remove("object");
        let req = review::decode(&serde_json::to_vec(&body).unwrap()).unwrap();
        assert!(matches!(extract(req.object), Err(WorkloadError::MissingObject)));
    }
}
