use crate::logic::SimulationPlan;

pub mod catalog;

pub use catalog::catalog_scenarios;

/// Named simulation script run by the logic tester.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: &'static str,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, plan: SimulationPlan) -> Self {
        Self {
            name,
            description,
            plan,
        }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let wanted = name.to_lowercase();
    catalog_scenarios()
        .into_iter()
        .find(|scenario| scenario.name == wanted)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .iter()
        .map(|scenario| (scenario.name, scenario.description))
        .collect()
}

/// Every scenario key, in catalog order.
pub fn scenario_names() -> Vec<&'static str> {
    catalog_scenarios()
        .iter()
        .map(|scenario| scenario.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(get_scenario("SMOKE").map(|s| s.name), Some("smoke"));
        assert!(get_scenario("no-such-scenario").is_none());
    }

    #[test]
    fn names_are_unique() {
        let names = scenario_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
        assert_eq!(list_scenarios().len(), names.len());
    }
}
