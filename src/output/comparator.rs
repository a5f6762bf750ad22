//! Presentation ordering for test units
//!
//! Independent of scheduling order: used only to lay results out
//! deterministically.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{ModuleResults, TestResult, TestUnit};

/// Orders units by module rank, then module name, then id
#[derive(Clone, Debug, Default)]
pub struct DisplayComparator {
    module_ranks: HashMap<String, usize>,
}

impl DisplayComparator {
    pub fn new(module_ranks: HashMap<String, usize>) -> Self {
        Self { module_ranks }
    }

    /// Rank modules by their position in `order`
    pub fn from_order<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut module_ranks = HashMap::new();
        for (rank, module) in order.into_iter().enumerate() {
            module_ranks.entry(module.into()).or_insert(rank);
        }
        Self { module_ranks }
    }

    pub fn rank(&self, module: &str) -> Option<usize> {
        self.module_ranks.get(module).copied()
    }

    pub fn compare(&self, a: &TestUnit, b: &TestUnit) -> Ordering {
        if a.module == b.module {
            return a.id.cmp(&b.id);
        }
        self.compare_modules(&a.module, &b.module)
    }

    pub fn compare_modules(&self, a: &str, b: &str) -> Ordering {
        match (self.rank(a), self.rank(b)) {
            (Some(ra), Some(rb)) => ra.cmp(&rb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
        }
    }

    pub fn sort_units(&self, units: &mut [TestUnit]) {
        units.sort_by(|a, b| self.compare(a, b));
    }

    pub fn sort_results(&self, results: &mut [TestResult]) {
        results.sort_by(|a, b| self.compare(&a.unit, &b.unit));
    }

    /// Sort modules, and the units inside each module, for display
    pub fn sort_modules(&self, modules: &mut [ModuleResults]) {
        modules.sort_by(|a, b| self.compare_modules(&a.module, &b.module));
        for module in modules.iter_mut() {
            self.sort_units(&mut module.outstanding);
            self.sort_units(&mut module.running);
            self.sort_results(&mut module.results);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparator() -> DisplayComparator {
        DisplayComparator::new(HashMap::from([
            ("d".to_string(), 0),
            ("c".to_string(), 1),
            ("a".to_string(), 2),
            ("b".to_string(), 3),
        ]))
    }

    fn unit(module: &str, id: &str) -> TestUnit {
        TestUnit::new(module, id, id)
    }

    #[test]
    fn test_ranked_modules_order_by_rank() {
        let cmp = comparator();
        assert_eq!(cmp.compare(&unit("a", "z"), &unit("b", "a")), Ordering::Less);
        assert_eq!(cmp.compare(&unit("d", "z"), &unit("c", "a")), Ordering::Less);
        assert_eq!(cmp.compare(&unit("b", "a"), &unit("a", "z")), Ordering::Greater);
    }

    #[test]
    fn test_same_module_orders_by_id() {
        let cmp = comparator();
        assert_eq!(cmp.compare(&unit("e", "a"), &unit("e", "b")), Ordering::Less);
        assert_eq!(cmp.compare(&unit("e", "b"), &unit("e", "a")), Ordering::Greater);
        assert_eq!(cmp.compare(&unit("a", "x"), &unit("a", "x")), Ordering::Equal);
    }

    #[test]
    fn test_ranked_module_sorts_before_unranked() {
        let cmp = comparator();
        assert_eq!(cmp.compare(&unit("b", "x"), &unit("e", "x")), Ordering::Less);
        assert_eq!(cmp.compare(&unit("e", "x"), &unit("b", "x")), Ordering::Greater);
    }

    #[test]
    fn test_unranked_modules_case_insensitive() {
        let cmp = comparator();
        assert_eq!(cmp.compare(&unit("Foo", "x"), &unit("bar", "x")), Ordering::Greater);
        assert_eq!(cmp.compare(&unit("apple", "x"), &unit("Zoo", "x")), Ordering::Less);
        // Names equal ignoring case still get a stable order
        assert_ne!(cmp.compare(&unit("Foo", "x"), &unit("foo", "x")), Ordering::Equal);
    }

    #[test]
    fn test_from_order_keeps_first_position() {
        let cmp = DisplayComparator::from_order(["zookeeper", "hdfs", "zookeeper"]);
        assert_eq!(cmp.rank("zookeeper"), Some(0));
        assert_eq!(cmp.rank("hdfs"), Some(1));
        assert_eq!(cmp.rank("kafka"), None);
    }

    #[test]
    fn test_sort_units() {
        let cmp = comparator();
        let mut units = vec![
            unit("e", "2"),
            unit("b", "1"),
            unit("E2", "1"),
            unit("d", "9"),
            unit("e", "1"),
            unit("a", "1"),
        ];
        cmp.sort_units(&mut units);

        let order: Vec<(&str, &str)> = units
            .iter()
            .map(|u| (u.module.as_str(), u.id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("d", "9"),
                ("a", "1"),
                ("b", "1"),
                ("e", "1"),
                ("e", "2"),
                ("E2", "1"),
            ]
        );
    }
}
