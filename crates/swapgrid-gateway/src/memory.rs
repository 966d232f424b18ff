//! In-memory cluster gateway.
//!
//! Models just enough orchestrator behaviour for the switcher to be
//! exercised end to end without a control plane:
//!
//! - resource-version stamping, with `Conflict` on stale service updates
//!   and `Invalid` on creates that still carry a stamp;
//! - replica status that converges only after a configurable number of
//!   reads following a create or scale;
//! - deletions that stay visible for a configurable number of reads;
//! - one-shot injected failures per [`Operation`], optionally delayed by
//!   a number of successful calls;
//! - a journal of every call, for asserting what was (not) mutated.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use swap_core::{LabelSelector, ReplicaGroup, Scale, Service};

use crate::error::{GatewayError, GatewayResult, ResourceKind};
use crate::gateway::{ClusterGateway, Deletion};

/// Gateway call, as recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetService,
    UpdateService,
    ListReplicaGroups,
    GetReplicaGroup,
    CreateReplicaGroup,
    DeleteReplicaGroup,
    GetScale,
    UpdateScale,
}

impl Operation {
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::UpdateService
                | Operation::CreateReplicaGroup
                | Operation::DeleteReplicaGroup
                | Operation::UpdateScale
        )
    }
}

struct GroupEntry {
    group: ReplicaGroup,
    /// Reads left before status converges to the desired count.
    pending_reads: u32,
    /// Reads left before a deleted group disappears.
    terminating: Option<u32>,
}

#[derive(Default)]
struct Cluster {
    services: BTreeMap<String, Service>,
    groups: BTreeMap<String, GroupEntry>,
    next_version: u64,
    rollout_reads: u32,
    termination_reads: u32,
    stalled: HashSet<String>,
    /// Per operation: (calls to let through first, error to return).
    faults: HashMap<Operation, VecDeque<(u32, GatewayError)>>,
    journal: Vec<(Operation, String)>,
}

impl Cluster {
    fn stamp(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    /// Journal the call and pop an injected failure, if one is queued.
    fn enter(&mut self, op: Operation, name: &str) -> GatewayResult<()> {
        self.journal.push((op, name.to_string()));
        let Some(queue) = self.faults.get_mut(&op) else {
            return Ok(());
        };
        match queue.front().map(|(skip, _)| *skip) {
            Some(0) => queue.pop_front().map_or(Ok(()), |(_, err)| Err(err)),
            Some(_) => {
                if let Some((skip, _)) = queue.front_mut() {
                    *skip -= 1;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn converge(&mut self, name: &str) {
        let stalled = self.stalled.contains(name);
        if let Some(entry) = self.groups.get_mut(name) {
            entry.pending_reads = 0;
            entry.group.status.replicas = entry.group.replicas;
            if !stalled {
                entry.group.status.available_replicas = entry.group.replicas;
            }
        }
    }

    /// Start driving a group toward its desired count.
    fn begin_rollout(&mut self, name: &str) {
        let rollout_reads = self.rollout_reads;
        if let Some(entry) = self.groups.get_mut(name) {
            entry.group.status.replicas = entry.group.replicas;
            entry.pending_reads = rollout_reads;
        }
        if rollout_reads == 0 {
            self.converge(name);
        }
    }

    fn live_group(&self, name: &str) -> GatewayResult<&GroupEntry> {
        self.groups
            .get(name)
            .filter(|e| e.terminating.is_none())
            .ok_or_else(|| GatewayError::not_found(ResourceKind::ReplicaGroup, name))
    }
}

/// Cloneable handle to an in-process cluster bound to one namespace.
#[derive(Clone)]
pub struct InMemoryGateway {
    namespace: String,
    cluster: Arc<Mutex<Cluster>>,
}

impl InMemoryGateway {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            cluster: Arc::new(Mutex::new(Cluster::default())),
        }
    }

    /// Number of reads after a create/scale before status reports the new
    /// desired count as available. Zero means immediately.
    pub fn with_rollout_reads(self, reads: u32) -> Self {
        self.cluster().rollout_reads = reads;
        self
    }

    /// Number of reads a deleted replica group stays visible for.
    pub fn with_termination_reads(self, reads: u32) -> Self {
        self.cluster().termination_reads = reads;
        self
    }

    fn cluster(&self) -> MutexGuard<'_, Cluster> {
        self.cluster.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Seeding and inspection ────────────────────────────────────

    /// Store a service as-is, assigning a fresh resource version.
    pub fn insert_service(&self, mut service: Service) {
        let mut cluster = self.cluster();
        service.resource_version = Some(cluster.stamp());
        cluster.services.insert(service.name.clone(), service);
    }

    /// Store a replica group with its status untouched.
    pub fn insert_replica_group(&self, mut group: ReplicaGroup) {
        let mut cluster = self.cluster();
        group.resource_version = Some(cluster.stamp());
        cluster.groups.insert(
            group.name.clone(),
            GroupEntry {
                group,
                pending_reads: 0,
                terminating: None,
            },
        );
    }

    /// Keep `name` from ever reaching full availability.
    pub fn stall(&self, name: &str) {
        self.cluster().stalled.insert(name.to_string());
    }

    /// Fail the next call of `op` with `err`. Queued failures are consumed
    /// in order.
    pub fn fail_next(&self, op: Operation, err: GatewayError) {
        self.fail_later(op, 0, err);
    }

    /// Let `after` calls of `op` through, then fail one with `err`.
    pub fn fail_later(&self, op: Operation, after: u32, err: GatewayError) {
        self.cluster()
            .faults
            .entry(op)
            .or_default()
            .push_back((after, err));
    }

    pub fn service(&self, name: &str) -> Option<Service> {
        self.cluster().services.get(name).cloned()
    }

    /// Peek at a replica group without counting as a read. Terminating
    /// groups are reported too.
    pub fn replica_group(&self, name: &str) -> Option<ReplicaGroup> {
        self.cluster().groups.get(name).map(|e| e.group.clone())
    }

    pub fn replica_group_names(&self) -> Vec<String> {
        self.cluster().groups.keys().cloned().collect()
    }

    pub fn journal(&self) -> Vec<(Operation, String)> {
        self.cluster().journal.clone()
    }

    pub fn mutations(&self) -> Vec<(Operation, String)> {
        self.journal()
            .into_iter()
            .filter(|(op, _)| op.is_mutation())
            .collect()
    }

    pub fn count(&self, op: Operation) -> usize {
        self.cluster().journal.iter().filter(|(o, _)| *o == op).count()
    }
}

impl ClusterGateway for InMemoryGateway {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_service(&self, name: &str) -> GatewayResult<Service> {
        let mut cluster = self.cluster();
        cluster.enter(Operation::GetService, name)?;
        cluster
            .services
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Service, name))
    }

    async fn update_service(&self, service: &Service) -> GatewayResult<Service> {
        let mut cluster = self.cluster();
        cluster.enter(Operation::UpdateService, &service.name)?;
        let stored = cluster
            .services
            .get(&service.name)
            .ok_or_else(|| GatewayError::not_found(ResourceKind::Service, &service.name))?;
        if service.resource_version.is_some() && service.resource_version != stored.resource_version
        {
            return Err(GatewayError::Conflict {
                kind: ResourceKind::Service,
                name: service.name.clone(),
            });
        }
        let mut updated = service.clone();
        updated.resource_version = Some(cluster.stamp());
        cluster
            .services
            .insert(updated.name.clone(), updated.clone());
        debug!(service = %updated.name, selector = %updated.selector, "service updated");
        Ok(updated)
    }

    async fn list_replica_groups(
        &self,
        selector: &LabelSelector,
    ) -> GatewayResult<Vec<ReplicaGroup>> {
        let mut cluster = self.cluster();
        cluster.enter(Operation::ListReplicaGroups, &selector.encode())?;
        Ok(cluster
            .groups
            .values()
            .filter(|e| selector.matches(&e.group.labels))
            .map(|e| e.group.clone())
            .collect())
    }

    async fn get_replica_group(&self, name: &str) -> GatewayResult<ReplicaGroup> {
        let mut cluster = self.cluster();
        cluster.enter(Operation::GetReplicaGroup, name)?;

        let not_found = || GatewayError::not_found(ResourceKind::ReplicaGroup, name);
        let entry = cluster.groups.get_mut(name).ok_or_else(not_found)?;

        if let Some(reads_left) = entry.terminating {
            if reads_left == 0 {
                cluster.groups.remove(name);
                debug!(replica_group = %name, "replica group finished terminating");
                return Err(not_found());
            }
            entry.terminating = Some(reads_left - 1);
            return Ok(entry.group.clone());
        }

        if entry.pending_reads > 0 {
            entry.pending_reads -= 1;
            if entry.pending_reads == 0 {
                cluster.converge(name);
            }
        }
        cluster
            .groups
            .get(name)
            .map(|e| e.group.clone())
            .ok_or_else(not_found)
    }

    async fn create_replica_group(&self, group: &ReplicaGroup) -> GatewayResult<ReplicaGroup> {
        let mut cluster = self.cluster();
        cluster.enter(Operation::CreateReplicaGroup, &group.name)?;

        let invalid = |message: &str| GatewayError::Invalid {
            kind: ResourceKind::ReplicaGroup,
            name: group.name.clone(),
            message: message.to_string(),
        };
        if group.resource_version.is_some() {
            return Err(invalid("resourceVersion should not be set on objects to be created"));
        }
        if group.namespace != self.namespace {
            return Err(invalid("namespace does not match the request"));
        }
        if cluster.groups.contains_key(&group.name) {
            return Err(GatewayError::AlreadyExists {
                kind: ResourceKind::ReplicaGroup,
                name: group.name.clone(),
            });
        }

        let mut created = group.clone();
        created.resource_version = Some(cluster.stamp());
        created.status.available_replicas = 0;
        cluster.groups.insert(
            created.name.clone(),
            GroupEntry {
                group: created,
                pending_reads: 0,
                terminating: None,
            },
        );
        cluster.begin_rollout(&group.name);
        debug!(replica_group = %group.name, replicas = group.replicas, "replica group created");

        cluster.live_group(&group.name).map(|e| e.group.clone())
    }

    async fn delete_replica_group(&self, name: &str) -> GatewayResult<Deletion> {
        let mut cluster = self.cluster();
        cluster.enter(Operation::DeleteReplicaGroup, name)?;

        let termination_reads = cluster.termination_reads;
        let Some(entry) = cluster.groups.get_mut(name) else {
            return Ok(Deletion::Absent);
        };
        if termination_reads == 0 {
            cluster.groups.remove(name);
        } else if entry.terminating.is_none() {
            entry.terminating = Some(termination_reads);
        }
        debug!(replica_group = %name, "replica group deleted");
        Ok(Deletion::Deleted)
    }

    async fn get_scale(&self, name: &str) -> GatewayResult<Scale> {
        let mut cluster = self.cluster();
        cluster.enter(Operation::GetScale, name)?;
        let entry = cluster.live_group(name)?;
        Ok(Scale {
            name: name.to_string(),
            replicas: entry.group.replicas,
            resource_version: entry.group.resource_version.clone(),
        })
    }

    async fn update_scale(&self, name: &str, scale: &Scale) -> GatewayResult<Scale> {
        let mut cluster = self.cluster();
        cluster.enter(Operation::UpdateScale, name)?;
        cluster.live_group(name)?;

        let version = cluster.stamp();
        if let Some(entry) = cluster.groups.get_mut(name) {
            entry.group.replicas = scale.replicas;
            entry.group.resource_version = Some(version.clone());
        }
        cluster.begin_rollout(name);
        debug!(replica_group = %name, replicas = scale.replicas, "replica group scaled");

        Ok(Scale {
            name: name.to_string(),
            replicas: scale.replicas,
            resource_version: Some(version),
        })
    }
}
