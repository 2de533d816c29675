//! Static table of every resource type cloudcensus knows how to count.
//!
//! Each entry pairs a provider listing (`tag`, passed to
//! [`CloudClient::list_page`](crate::backend::CloudClient::list_page)) with the rule
//! that turns one listed item into a node count.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::Provider;

/// Running count for one probe, plus an optional breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: u64,
    pub breakdown: BTreeMap<String, u64>,
}

impl Tally {
    /// Counts saturate at `u64::MAX`.
    pub fn add(&mut self, n: u64) {
        self.count = self.count.saturating_add(n);
    }

    /// Add `n` to the total and to the named breakdown bucket.
    pub fn add_to(&mut self, bucket: &str, n: u64) {
        self.add(n);
        let slot = self.breakdown.entry(bucket.to_string()).or_insert(0);
        *slot = slot.saturating_add(n);
    }
}

pub type TallyFn = fn(&Value, &mut Tally);

pub struct ResourceKind {
    pub provider: Provider,
    /// Name used by `--resources` and by the client listing call.
    pub tag: &'static str,
    /// Normalized type name used in reports.
    pub type_name: &'static str,
    pub label: &'static str,
    /// Not-found means "service has nothing here" rather than a soft warning.
    pub absent_on_not_found: bool,
    pub tally: TallyFn,
}

impl std::fmt::Debug for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceKind")
            .field("provider", &self.provider)
            .field("tag", &self.tag)
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn str_at<'a>(item: &'a Value, pointer: &str) -> Option<&'a str> {
    item.pointer(pointer).and_then(Value::as_str)
}

fn u64_at(item: &Value, pointer: &str) -> Option<u64> {
    let v = item.pointer(pointer)?;
    v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

fn one_each(_: &Value, tally: &mut Tally) {
    tally.add(1);
}

fn one_by(item: &Value, tally: &mut Tally, pointer: &str) {
    tally.add_to(str_at(item, pointer).unwrap_or("unknown"), 1);
}

fn ec2_instance(item: &Value, tally: &mut Tally) {
    one_by(item, tally, "/State/Name");
}

fn eks_nodegroup(item: &Value, tally: &mut Tally) {
    tally.add(u64_at(item, "/scalingConfig/desiredSize").unwrap_or(0));
}

fn ecs_task(item: &Value, tally: &mut Tally) {
    let cluster = str_at(item, "/clusterArn")
        .and_then(|arn| arn.rsplit('/').next())
        .unwrap_or("unknown");
    tally.add_to(cluster, 1);
}

fn lambda_function(item: &Value, tally: &mut Tally) {
    tally.add_to(str_at(item, "/Runtime").unwrap_or("N/A"), 1);
}

fn lightsail_instance(item: &Value, tally: &mut Tally) {
    one_by(item, tally, "/state/name");
}

fn batch_environment(item: &Value, tally: &mut Tally) {
    if str_at(item, "/state") != Some("ENABLED") {
        return;
    }
    let vcpus = u64_at(item, "/computeResources/desiredvCpus").unwrap_or(0);
    if vcpus > 0 {
        // Rough estimate: two vCPUs per node.
        tally.add((vcpus / 2).max(1));
    }
}

fn azure_vm(item: &Value, tally: &mut Tally) {
    one_by(item, tally, "/location");
}

fn aks_cluster(item: &Value, tally: &mut Tally) {
    if let Some(pools) = item.pointer("/properties/agentPoolProfiles").and_then(Value::as_array) {
        for pool in pools {
            tally.add(u64_at(pool, "/count").unwrap_or(0));
        }
    }
}

fn container_group(item: &Value, tally: &mut Tally) {
    let containers = item
        .pointer("/properties/containers")
        .and_then(Value::as_array)
        .map(|c| c.len() as u64)
        .filter(|n| *n > 0)
        .unwrap_or(1);
    tally.add(containers);
}

fn function_app(item: &Value, tally: &mut Tally) {
    let is_function = str_at(item, "/kind")
        .map(|k| k.to_ascii_lowercase().contains("functionapp"))
        .unwrap_or(false);
    if is_function {
        tally.add_to(str_at(item, "/properties/state").unwrap_or("unknown"), 1);
    }
}

fn scale_set(item: &Value, tally: &mut Tally) {
    tally.add(u64_at(item, "/sku/capacity").unwrap_or(0));
}

fn batch_pool(item: &Value, tally: &mut Tally) {
    let dedicated = u64_at(item, "/properties/currentDedicatedNodes").unwrap_or(0);
    let low_priority = u64_at(item, "/properties/currentLowPriorityNodes").unwrap_or(0);
    if dedicated > 0 {
        tally.add_to("dedicated", dedicated);
    }
    if low_priority > 0 {
        tally.add_to("low_priority", low_priority);
    }
}

fn gce_instance(item: &Value, tally: &mut Tally) {
    one_by(item, tally, "/status");
}

fn gke_cluster(item: &Value, tally: &mut Tally) {
    if let Some(pools) = item.pointer("/nodePools").and_then(Value::as_array) {
        for pool in pools {
            let nodes = u64_at(pool, "/currentNodeCount")
                .or_else(|| u64_at(pool, "/initialNodeCount"))
                .unwrap_or(0);
            tally.add(nodes);
        }
    }
}

pub static CATALOG: &[ResourceKind] = &[
    ResourceKind {
        provider: Provider::Aws,
        tag: "ec2",
        type_name: "EC2Instances",
        label: "EC2 Instances",
        absent_on_not_found: true,
        tally: ec2_instance,
    },
    ResourceKind {
        provider: Provider::Aws,
        tag: "eks",
        type_name: "EKSNodes",
        label: "EKS Nodes",
        absent_on_not_found: true,
        tally: eks_nodegroup,
    },
    ResourceKind {
        provider: Provider::Aws,
        tag: "ecs",
        type_name: "ECSTasks",
        label: "ECS Tasks (Running)",
        absent_on_not_found: true,
        tally: ecs_task,
    },
    ResourceKind {
        provider: Provider::Aws,
        tag: "lambda",
        type_name: "LambdaFunctions",
        label: "Lambda Functions",
        absent_on_not_found: true,
        tally: lambda_function,
    },
    ResourceKind {
        provider: Provider::Aws,
        tag: "lightsail",
        type_name: "LightsailInstances",
        label: "Lightsail Instances",
        absent_on_not_found: true,
        tally: lightsail_instance,
    },
    ResourceKind {
        provider: Provider::Aws,
        tag: "batch",
        type_name: "BatchComputeNodes",
        label: "Batch Compute Nodes",
        absent_on_not_found: true,
        tally: batch_environment,
    },
    ResourceKind {
        provider: Provider::Azure,
        tag: "vms",
        type_name: "VirtualMachines",
        label: "Virtual Machines",
        absent_on_not_found: false,
        tally: azure_vm,
    },
    ResourceKind {
        provider: Provider::Azure,
        tag: "aks",
        type_name: "AKSNodes",
        label: "AKS Nodes",
        absent_on_not_found: true,
        tally: aks_cluster,
    },
    ResourceKind {
        provider: Provider::Azure,
        tag: "aci",
        type_name: "ContainerInstances",
        label: "Container Instances",
        absent_on_not_found: true,
        tally: container_group,
    },
    ResourceKind {
        provider: Provider::Azure,
        tag: "functions",
        type_name: "FunctionApps",
        label: "Azure Functions",
        absent_on_not_found: true,
        tally: function_app,
    },
    ResourceKind {
        provider: Provider::Azure,
        tag: "vmss",
        type_name: "VMSSInstances",
        label: "VM Scale Set Instances",
        absent_on_not_found: false,
        tally: scale_set,
    },
    ResourceKind {
        provider: Provider::Azure,
        tag: "batch",
        type_name: "BatchPoolNodes",
        label: "Batch Pool Nodes",
        absent_on_not_found: true,
        tally: batch_pool,
    },
    ResourceKind {
        provider: Provider::Gcp,
        tag: "gce",
        type_name: "ComputeEngineVMs",
        label: "Compute Engine VMs",
        absent_on_not_found: false,
        tally: gce_instance,
    },
    ResourceKind {
        provider: Provider::Gcp,
        tag: "gke",
        type_name: "GKENodes",
        label: "GKE Nodes",
        absent_on_not_found: true,
        tally: gke_cluster,
    },
    ResourceKind {
        provider: Provider::Gcp,
        tag: "cloud_run",
        type_name: "CloudRunServices",
        label: "Cloud Run Services",
        absent_on_not_found: true,
        tally: one_each,
    },
    ResourceKind {
        provider: Provider::Gcp,
        tag: "cloud_functions",
        type_name: "CloudFunctions",
        label: "Cloud Functions",
        absent_on_not_found: true,
        tally: one_each,
    },
    ResourceKind {
        provider: Provider::Gcp,
        tag: "app_engine",
        type_name: "AppEngineInstances",
        label: "App Engine Instances",
        absent_on_not_found: true,
        tally: one_each,
    },
];

pub fn kinds_for(provider: Provider) -> impl Iterator<Item = &'static ResourceKind> {
    CATALOG.iter().filter(move |k| k.provider == provider)
}

pub fn find(provider: Provider, tag: &str) -> Option<&'static ResourceKind> {
    kinds_for(provider).find(|k| k.tag.eq_ignore_ascii_case(tag))
}

/// Human label for a normalized type name, falling back to the name itself.
pub fn label_for(type_name: &str) -> &str {
    CATALOG
        .iter()
        .find(|k| k.type_name == type_name)
        .map(|k| k.label)
        .unwrap_or(type_name)
}

/// Kinds of `provider` allowed by `filter`; `None` selects all of them.
pub fn select(provider: Provider, filter: Option<&[String]>) -> Vec<&'static ResourceKind> {
    kinds_for(provider)
        .filter(|k| match filter {
            None => true,
            Some(tags) => tags.iter().any(|t| t.trim().eq_ignore_ascii_case(k.tag)),
        })
        .collect()
}
