//! Subtask registry.
//!
//! Maps subtask names to their metadata, the raw data they scan and the row
//! extractor that transforms it. Built once at startup and read-only after.

use std::collections::BTreeMap;

use crate::error::RunnerError;
use crate::jenkins::{self, BuildExtractor, JenkinsApiParams};
use crate::runtime::api_extractor::{ApiExtractor, RowExtractor, RunnerOptions};
use crate::runtime::raw_data::RawDataSubTaskArgs;
use crate::runtime::subtask::{DomainType, SubTaskMeta};

/// Error type for registry lookups
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Subtask not found: {0}")]
    NotFound(String),
}

/// A registered extraction subtask
pub struct RegisteredTask {
    pub meta: SubTaskMeta,
    pub args: RawDataSubTaskArgs,
    extractor: Box<dyn RowExtractor>,
}

impl RegisteredTask {
    pub fn extractor(&self) -> &dyn RowExtractor {
        self.extractor.as_ref()
    }

    /// Runner for this subtask with the given options.
    pub fn runner(&self, options: RunnerOptions) -> Result<ApiExtractor<'_>, RunnerError> {
        ApiExtractor::new(self.args.clone(), self.extractor(), options)
    }
}

/// Registry of extraction subtasks, ordered by name
#[derive(Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, RegisteredTask>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the Jenkins subtasks for one connection.
    pub fn jenkins(connection_id: u64) -> Result<Self, RunnerError> {
        let mut registry = Self::new();
        registry.register(
            jenkins::extract_api_builds_meta(),
            JenkinsApiParams::new(connection_id).build_args()?,
            Box::new(BuildExtractor::new(connection_id)),
        );
        Ok(registry)
    }

    /// Register a subtask, replacing any previous one with the same name
    pub fn register(
        &mut self,
        meta: SubTaskMeta,
        args: RawDataSubTaskArgs,
        extractor: Box<dyn RowExtractor>,
    ) {
        let name = meta.name.clone();
        self.tasks.insert(
            name,
            RegisteredTask {
                meta,
                args,
                extractor,
            },
        );
    }

    pub fn get(&self, name: &str) -> Result<&RegisteredTask, RegistryError> {
        self.tasks
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn has_task(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Metadata of every registered subtask, by name
    pub fn list(&self) -> Vec<&SubTaskMeta> {
        self.tasks.values().map(|t| &t.meta).collect()
    }

    /// Subtasks that run unless explicitly disabled
    pub fn enabled(&self) -> impl Iterator<Item = &RegisteredTask> {
        self.tasks.values().filter(|t| t.meta.enabled_by_default)
    }

    /// Metadata of the subtasks producing data for `domain`, by name
    pub fn covering(&self, domain: DomainType) -> Vec<&SubTaskMeta> {
        self.tasks
            .values()
            .map(|t| &t.meta)
            .filter(|meta| meta.covers(domain))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
