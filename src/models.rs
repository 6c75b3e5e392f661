//! Model hierarchy.
//!
//! Models form a DAG: each model names zero or more parent models it can be
//! translated into. Nodes restricted to a parent model are usable for all of
//! its descendants, and the capability resolver walks this ancestry when
//! preferring model-specific nodes.

use std::collections::{BTreeMap, HashSet, VecDeque};

/// Parent relation between configuration models.
#[derive(Debug, Clone, Default)]
pub struct ModelHierarchy {
    parents: BTreeMap<String, Vec<String>>,
}

impl ModelHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a model and its direct parents. Redeclaring replaces the
    /// parent list. Parents not yet declared are registered as root models.
    pub fn declare<I, S>(&mut self, model: impl Into<String>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parents: Vec<String> = parents.into_iter().map(Into::into).collect();
        for parent in &parents {
            self.parents.entry(parent.clone()).or_default();
        }
        self.parents.insert(model.into(), parents);
    }

    pub fn contains(&self, model: &str) -> bool {
        self.parents.contains_key(model)
    }

    /// Direct parents. Unknown models have none.
    pub fn parents(&self, model: &str) -> &[String] {
        self.parents.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The model followed by all of its ancestors, nearest first.
    pub fn lineage(&self, model: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue = VecDeque::from([model.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for parent in self.parents(&current) {
                queue.push_back(parent.clone());
            }
            out.push(current);
        }

        out
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModelHierarchy {
        let mut h = ModelHierarchy::new();
        h.declare("CMSSM", ["NUHM1"]);
        h.declare("NUHM1", ["NUHM2"]);
        h.declare("NUHM2", ["MSSM25"]);
        h
    }

    #[test]
    fn test_lineage_nearest_first() {
        let h = sample();
        assert_eq!(h.lineage("CMSSM"), vec!["CMSSM", "NUHM1", "NUHM2", "MSSM25"]);
        assert_eq!(h.lineage("MSSM25"), vec!["MSSM25"]);
    }

    #[test]
    fn test_unknown_model_is_its_own_lineage() {
        let h = sample();
        assert!(h.parents("Unknown").is_empty());
        assert_eq!(h.lineage("Unknown"), vec!["Unknown"]);
        assert!(!h.contains("Unknown"));
    }

    #[test]
    fn test_parents_registered_implicitly() {
        let h = sample();
        assert!(h.contains("MSSM25"));
        assert_eq!(h.len(), 4);
    }

    #[test]
    fn test_diamond_lineage_visits_once() {
        let mut h = ModelHierarchy::new();
        h.declare("Child", ["Left", "Right"]);
        h.declare("Left", ["Root"]);
        h.declare("Right", ["Root"]);
        let lineage = h.lineage("Child");
        assert_eq!(lineage.len(), 4);
        assert_eq!(lineage.iter().filter(|m| *m == "Root").count(), 1);
    }
}
