//! The registry of chart artifacts
//!
//! [`Resources`] holds one [`Slot`] per artifact the chart can render. Slot
//! identifiers follow the chart's naming convention (`<Kind>/<fullName><suffix>`),
//! so routing a rendered document is a string comparison against
//! `kind + "/" + metadata.name`. Documents with no matching slot are ignored:
//! the registry only tracks what the scenarios assert on.

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use serde_json::Value;
use tracing::{debug, warn};

use crate::document::RenderedDocument;
use crate::monitoring::PodMonitor;
use crate::slot::{Slot, SlotEntry};
use crate::yaml::split_documents;
use crate::{HarnessError, Result, CONF_SLOT_ID};

/// Number of slots in every registry
pub const SLOT_COUNT: usize = 12;

/// Every artifact of one chart render
#[derive(Debug, Clone, PartialEq)]
pub struct Resources {
    /// Decoded server configuration (from the ConfigMap's `nats.conf`)
    pub conf: Slot<Value>,
    /// `ConfigMap/<n>-config`
    pub config_map: Slot<ConfigMap>,
    /// `Service/<n>-headless`
    pub headless_service: Slot<Service>,
    /// `Ingress/<n>-ws`
    pub ingress: Slot<Ingress>,
    /// `Secret/<n>-box-contents`
    pub nats_box_contents_secret: Slot<Secret>,
    /// `Secret/<n>-box-context`
    pub nats_box_context_secret: Slot<Secret>,
    /// `Deployment/<n>-box`
    pub nats_box_deployment: Slot<Deployment>,
    /// `Service/<n>`
    pub service: Slot<Service>,
    /// `StatefulSet/<n>`
    pub stateful_set: Slot<StatefulSet>,
    /// `PodMonitor/<n>`
    pub pod_monitor: Slot<PodMonitor>,
    /// `ConfigMap/<n>-extra`
    pub extra_config_map: Slot<ConfigMap>,
    /// `Service/<n>-extra`
    pub extra_service: Slot<Service>,
}

impl Resources {
    /// Build an empty registry for the chart's full name
    pub fn build(full_name: &str) -> Self {
        Self {
            conf: Slot::new(CONF_SLOT_ID),
            config_map: Slot::new(format!("ConfigMap/{full_name}-config")),
            headless_service: Slot::new(format!("Service/{full_name}-headless")),
            ingress: Slot::new(format!("Ingress/{full_name}-ws")),
            nats_box_contents_secret: Slot::new(format!("Secret/{full_name}-box-contents")),
            nats_box_context_secret: Slot::new(format!("Secret/{full_name}-box-context")),
            nats_box_deployment: Slot::new(format!("Deployment/{full_name}-box")),
            service: Slot::new(format!("Service/{full_name}")),
            stateful_set: Slot::new(format!("StatefulSet/{full_name}")),
            pod_monitor: Slot::new(format!("PodMonitor/{full_name}")),
            extra_config_map: Slot::new(format!("ConfigMap/{full_name}-extra")),
            extra_service: Slot::new(format!("Service/{full_name}-extra")),
        }
    }

    /// All slots in construction order
    pub fn entries(&self) -> [&dyn SlotEntry; SLOT_COUNT] {
        [
            &self.conf,
            &self.config_map,
            &self.headless_service,
            &self.ingress,
            &self.nats_box_contents_secret,
            &self.nats_box_context_secret,
            &self.nats_box_deployment,
            &self.service,
            &self.stateful_set,
            &self.pod_monitor,
            &self.extra_config_map,
            &self.extra_service,
        ]
    }

    /// All slots in construction order, mutably
    pub fn entries_mut(&mut self) -> [&mut dyn SlotEntry; SLOT_COUNT] {
        [
            &mut self.conf,
            &mut self.config_map,
            &mut self.headless_service,
            &mut self.ingress,
            &mut self.nats_box_contents_secret,
            &mut self.nats_box_context_secret,
            &mut self.nats_box_deployment,
            &mut self.service,
            &mut self.stateful_set,
            &mut self.pod_monitor,
            &mut self.extra_config_map,
            &mut self.extra_service,
        ]
    }

    /// Look up a slot by identifier
    pub fn entry(&self, id: &str) -> Option<&dyn SlotEntry> {
        self.entries().into_iter().find(|e| e.id() == id)
    }

    /// Look up a slot by identifier, mutably
    pub fn entry_mut(&mut self, id: &str) -> Option<&mut dyn SlotEntry> {
        self.entries_mut().into_iter().find(|e| e.id() == id)
    }

    /// Identifiers of every populated slot, in construction order
    pub fn present_ids(&self) -> Vec<&str> {
        self.entries()
            .into_iter()
            .filter(|e| e.is_present())
            .map(|e| e.id())
            .collect()
    }

    /// Route every document of a rendered bundle into its slot.
    ///
    /// Returns the number of documents routed. Empty documents and documents
    /// whose routing key matches no slot are skipped. A document routed to
    /// an already-populated slot replaces the earlier value.
    pub fn populate(&mut self, bundle: &str) -> Result<usize> {
        let mut routed = 0;

        for (index, text) in split_documents(bundle).into_iter().enumerate() {
            let Some(doc) = RenderedDocument::parse(index, text)? else {
                continue;
            };
            let Some(key) = doc.routing_key() else {
                debug!(index, "skipping document without kind/metadata.name");
                continue;
            };

            let id = key.to_string();
            let Some(slot) = self.entry_mut(&id) else {
                debug!(index, id = %id, "ignoring untracked document");
                continue;
            };

            if slot.is_present() {
                warn!(index, id = %id, "document routed twice, keeping the later one");
            }
            slot.fill(doc.into_body())
                .map_err(|e| HarnessError::decode(&id, e.to_string()))?;
            debug!(index, id = %id, "routed document");
            routed += 1;
        }

        Ok(routed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX_BUNDLE: &str = r#"---
# Source: nats/templates/nats-box/deployment.yaml
apiVersion: apps/v1
kind: Deployment
metadata:
  name: nats-box
spec:
  replicas: 1
  selector:
    matchLabels:
      app.kubernetes.io/component: nats-box
  template:
    metadata:
      labels:
        app.kubernetes.io/component: nats-box
    spec:
      containers:
      - name: nats-box
        image: natsio/nats-box:0.13.8
---
# Source: nats/templates/nats-box/context-secret.yaml
apiVersion: v1
kind: Secret
metadata:
  name: nats-box-context
type: Opaque
stringData:
  default.json: '{"url":"nats://nats"}'
---
# Source: nats/templates/pod-disruption-budget.yaml
apiVersion: policy/v1
kind: PodDisruptionBudget
metadata:
  name: nats
spec:
  maxUnavailable: 1
"#;

    #[test]
    fn identifiers_follow_chart_naming() {
        let resources = Resources::build("my-nats");
        let ids: Vec<_> = resources.entries().into_iter().map(|e| e.id().to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "nats.conf",
                "ConfigMap/my-nats-config",
                "Service/my-nats-headless",
                "Ingress/my-nats-ws",
                "Secret/my-nats-box-contents",
                "Secret/my-nats-box-context",
                "Deployment/my-nats-box",
                "Service/my-nats",
                "StatefulSet/my-nats",
                "PodMonitor/my-nats",
                "ConfigMap/my-nats-extra",
                "Service/my-nats-extra",
            ]
        );
    }

    #[test]
    fn identifiers_are_unique() {
        let resources = Resources::build("nats");
        let mut ids: Vec<_> = resources.entries().into_iter().map(|e| e.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), SLOT_COUNT);
    }

    #[test]
    fn fresh_registry_is_empty() {
        assert!(Resources::build("nats").present_ids().is_empty());
    }

    #[test]
    fn populate_routes_tracked_documents_only() {
        let mut resources = Resources::build("nats");
        let routed = resources.populate(BOX_BUNDLE).unwrap();

        assert_eq!(routed, 2);
        assert_eq!(
            resources.present_ids(),
            vec!["Secret/nats-box-context", "Deployment/nats-box"]
        );

        let deployment = resources.nats_box_deployment.value().unwrap();
        let pod_spec = deployment.spec.as_ref().unwrap().template.spec.as_ref();
        let containers = &pod_spec.unwrap().containers;
        assert_eq!(containers[0].image.as_deref(), Some("natsio/nats-box:0.13.8"));

        let secret = resources.nats_box_context_secret.value().unwrap();
        assert_eq!(
            secret.string_data.as_ref().unwrap()["default.json"],
            r#"{"url":"nats://nats"}"#
        );
    }

    #[test]
    fn other_base_name_matches_nothing() {
        let mut resources = Resources::build("other");
        assert_eq!(resources.populate(BOX_BUNDLE).unwrap(), 0);
        assert!(resources.present_ids().is_empty());
    }

    #[test]
    fn later_duplicate_replaces_earlier() {
        let bundle = "\
kind: ConfigMap
apiVersion: v1
metadata:
  name: nats-extra
data:
  a: one
---
kind: ConfigMap
apiVersion: v1
metadata:
  name: nats-extra
data:
  b: two
";
        let mut resources = Resources::build("nats");
        assert_eq!(resources.populate(bundle).unwrap(), 2);

        let data = resources.extra_config_map.value().unwrap().data.clone().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data["b"], "two");
    }

    #[test]
    fn undecodable_document_names_its_slot() {
        let bundle = "\
apiVersion: apps/v1
kind: StatefulSet
metadata:
  name: nats
spec:
  replicas: many
";
        let err = Resources::build("nats").populate(bundle).unwrap_err();
        assert_eq!(err.slot_id(), Some("StatefulSet/nats"));
    }

    #[test]
    fn entry_lookup_by_id() {
        let mut resources = Resources::build("nats");
        assert!(resources.entry("Service/nats-headless").is_some());
        assert!(resources.entry("Service/missing").is_none());
        assert!(resources.entry_mut("PodMonitor/nats").is_some());
    }
}
