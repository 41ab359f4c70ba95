//! In-memory consumer catalog.
//!
//! Holds consumers, consumer groups and the errata applicable to each
//! consumer, and resolves group operations into per-consumer payloads.
//! Seeded from the `catalog` configuration section.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::fanout::{OperationSpec, Payload, Target};
use crate::interfaces::resolver::Result;
use crate::interfaces::{ResolutionError, TargetResolver};

/// Architecture of source packages, which are never installed.
const SOURCE_ARCH: &str = "src";

/// A package carried by an erratum.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageRef {
    pub name: String,
    pub arch: String,
}

/// An erratum applicable to a consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ErratumRecord {
    pub id: String,
    /// Erratum type (security, bugfix, enhancement).
    #[serde(rename = "type")]
    pub erratum_type: String,
    pub packages: Vec<PackageRef>,
}

/// A registered consumer and its applicable errata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConsumerRecord {
    pub id: String,
    pub errata: Vec<ErratumRecord>,
}

/// Catalog configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub consumers: Vec<ConsumerRecord>,
    /// Group id -> member consumer ids, in member order.
    pub groups: BTreeMap<String, Vec<String>>,
}

/// `TargetResolver` over an in-memory catalog.
#[derive(Debug, Default)]
pub struct CatalogResolver {
    consumers: HashMap<String, ConsumerRecord>,
    groups: BTreeMap<String, Vec<String>>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        let mut resolver = Self::new();
        for consumer in &config.consumers {
            resolver.add_consumer(consumer.clone());
        }
        for (group_id, members) in &config.groups {
            resolver.add_group(group_id.clone(), members.clone());
        }
        resolver
    }

    pub fn add_consumer(&mut self, consumer: ConsumerRecord) {
        self.consumers.insert(consumer.id.clone(), consumer);
    }

    /// Register a group. Members are validated at resolution time.
    pub fn add_group(&mut self, group_id: impl Into<String>, members: Vec<String>) {
        self.groups.insert(group_id.into(), members);
    }

    fn group_members(&self, group_id: &str) -> Result<Vec<&ConsumerRecord>> {
        let members = self
            .groups
            .get(group_id)
            .ok_or_else(|| ResolutionError::GroupNotFound(group_id.to_string()))?;

        members
            .iter()
            .map(|id| {
                self.consumers
                    .get(id)
                    .ok_or_else(|| ResolutionError::ConsumerNotFound(id.clone()))
            })
            .collect()
    }

    /// Packages to install on `consumer` for an errata operation.
    fn errata_packages(
        consumer: &ConsumerRecord,
        errata_ids: &[String],
        types: &[String],
    ) -> Result<Vec<String>> {
        let applicable: Vec<&ErratumRecord> = consumer
            .errata
            .iter()
            .filter(|e| types.is_empty() || types.contains(&e.erratum_type))
            .collect();

        let selected: Vec<&ErratumRecord> = if errata_ids.is_empty() {
            applicable
        } else {
            errata_ids
                .iter()
                .map(|eid| {
                    applicable
                        .iter()
                        .find(|e| &e.id == eid)
                        .copied()
                        .ok_or_else(|| ResolutionError::ErratumNotApplicable {
                            consumer: consumer.id.clone(),
                            erratum: eid.clone(),
                        })
                })
                .collect::<Result<_>>()?
        };

        let mut seen = HashSet::new();
        Ok(selected
            .into_iter()
            .flat_map(|e| e.packages.iter())
            .filter(|p| p.arch != SOURCE_ARCH)
            .filter(|p| seen.insert(p.name.clone()))
            .map(|p| p.name.clone())
            .collect())
    }
}

#[async_trait]
impl TargetResolver for CatalogResolver {
    async fn members(&self, group_id: &str) -> Result<Vec<Target>> {
        Ok(self
            .group_members(group_id)?
            .into_iter()
            .map(|c| Target::new(c.id.clone()))
            .collect())
    }

    async fn resolve(
        &self,
        group_id: &str,
        operation: &OperationSpec,
    ) -> Result<Vec<(Target, Payload)>> {
        let members = self.group_members(group_id)?;

        match operation {
            OperationSpec::InstallPackages { packages } => Ok(members
                .into_iter()
                .map(|c| (Target::new(c.id.clone()), Payload::new(packages.iter().cloned())))
                .collect()),
            OperationSpec::ApplyErrata { errata_ids, types } => members
                .into_iter()
                .map(|c| -> Result<(Target, Payload)> {
                    let packages = Self::errata_packages(c, errata_ids, types)?;
                    debug!(consumer = %c.id, ?packages, "Packages to install");
                    Ok((Target::new(c.id.clone()), Payload::new(packages)))
                })
                .collect(),
        }
    }
}
