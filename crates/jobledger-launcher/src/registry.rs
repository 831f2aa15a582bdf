//! Job registry.

use dashmap::DashMap;
use tracing::debug;

use crate::error::LaunchError;
use crate::job::Job;

/// Jobs known to a context, keyed by name.
///
/// Thread-safe; registration rejects duplicate names.
pub struct JobRegistry {
    jobs: DashMap<String, Job>,
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }

    /// Register a job.
    ///
    /// Returns an error if a job with the same name is already registered.
    pub fn register(&self, job: Job) -> Result<(), LaunchError> {
        let name = job.name().to_string();

        if self.jobs.contains_key(&name) {
            return Err(LaunchError::AlreadyRegistered(name));
        }

        debug!("Registered job '{}'", name);
        self.jobs.insert(name, job);
        Ok(())
    }

    /// Remove a job by name.
    pub fn unregister(&self, name: &str) -> Result<Job, LaunchError> {
        self.jobs
            .remove(name)
            .map(|(_, job)| job)
            .ok_or_else(|| LaunchError::NoSuchJob(name.to_string()))
    }

    /// Get a job by name.
    pub fn get(&self, name: &str) -> Option<Job> {
        self.jobs.get(name).map(|job| job.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Registered jobs, sorted by name.
    pub fn jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|entry| entry.value().clone()).collect();
        jobs.sort_by(|a, b| a.name().cmp(b.name()));
        jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobledger_core::JobDefinition;

    fn job(name: &str) -> Job {
        Job::noop(JobDefinition::new(name))
    }

    #[test]
    fn test_registry_new() {
        let registry = JobRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_get() {
        let registry = JobRegistry::new();
        registry.register(job("import")).unwrap();

        assert!(registry.contains("import"));
        assert_eq!(registry.get("import").unwrap().name(), "import");
        assert!(registry.get("export").is_none());
    }

    #[test]
    fn test_register_duplicate() {
        let registry = JobRegistry::new();
        registry.register(job("import")).unwrap();

        let result = registry.register(job("import"));
        assert!(matches!(result, Err(LaunchError::AlreadyRegistered(ref n)) if n == "import"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = JobRegistry::new();
        registry.register(job("import")).unwrap();

        assert_eq!(registry.unregister("import").unwrap().name(), "import");
        assert!(registry.is_empty());
        assert!(matches!(
            registry.unregister("import"),
            Err(LaunchError::NoSuchJob(_))
        ));
    }

    #[test]
    fn test_sorted_listing() {
        let registry = JobRegistry::new();
        registry.register(job("c")).unwrap();
        registry.register(job("a")).unwrap();
        registry.register(job("b")).unwrap();

        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        let names: Vec<_> = registry.jobs().iter().map(|j| j.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
