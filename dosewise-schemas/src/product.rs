use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDose {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// A multi-ingredient formula. `cost` is the price of the whole container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub cost: f64,
    pub servings: u32,
    pub ingredients: Vec<IngredientDose>,
}

impl Product {
    pub fn cost_per_serving(&self) -> f64 {
        self.cost / f64::from(self.servings)
    }
}
