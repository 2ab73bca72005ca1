//! Known branches and menu items
//!
//! The catalog feeds selection lists and warnings. The record store does not
//! enforce membership: any non-empty branch or dish name is accepted.

use serde::{Deserialize, Serialize};

const DEFAULT_BRANCHES: &[&str] = &[
    "Haifa",
    "Rishon LeZion",
    "Ramat HaSharon",
    "Ness Ziona",
    "Landmark",
    "Petah Tikva",
    "Herzliya",
    "Savyon",
];

const DEFAULT_DISHES: &[&str] = &[
    "Pad Thai",
    "Malaysian",
    "Filipino",
    "Afghan",
    "Pumpkin Curry",
    "Szechuan",
    "Beef Rice",
    "Fried Rice",
    "Salmon Maki",
    "Tuna Maki",
    "Spicy Salmon",
    "Kids Noodles",
];

/// Enumerated branches and dishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default = "default_branches")]
    pub branches: Vec<String>,

    #[serde(default = "default_dishes")]
    pub dishes: Vec<String>,
}

fn default_branches() -> Vec<String> {
    DEFAULT_BRANCHES.iter().map(|s| s.to_string()).collect()
}

fn default_dishes() -> Vec<String> {
    DEFAULT_DISHES.iter().map(|s| s.to_string()).collect()
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            branches: default_branches(),
            dishes: default_dishes(),
        }
    }
}

impl Catalog {
    pub fn is_known_branch(&self, name: &str) -> bool {
        let name = name.trim();
        self.branches.iter().any(|b| b == name)
    }

    pub fn is_known_dish(&self, name: &str) -> bool {
        let name = name.trim();
        self.dishes.iter().any(|d| d == name)
    }
}
