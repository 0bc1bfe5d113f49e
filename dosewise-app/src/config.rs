use anyhow::{Context, Result};
use dosewise_schemas::{
    dosage::DosageRange,
    file_formats::{DosageFile, OfferFile, ProductFile},
    offer::IngredientOffer,
    product::Product,
};
use serde::de::DeserializeOwned;
use std::{collections::BTreeMap, fs, path::Path};
use tracing::info;

/// Everything read from the data directory for one analysis run.
pub struct KnowledgeBase {
    pub offers: Vec<IngredientOffer>,
    pub dosages: BTreeMap<String, DosageRange>,
    pub products: Vec<Product>,
}

impl KnowledgeBase {
    /// Loads all data files from `offers/`, `dosages/` and `products/` under `base_path`.
    pub fn load(base_path: &str) -> Result<Self> {
        info!(path = %base_path, "Loading knowledge base");

        let offers = load_files(Path::new(base_path).join("offers"), |file: OfferFile| {
            file.offers
        })?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        let mut dosages = BTreeMap::new();
        for batch in load_files(Path::new(base_path).join("dosages"), |file: DosageFile| {
            file.dosages
        })? {
            dosages.extend(batch);
        }

        let products = load_files(Path::new(base_path).join("products"), |file: ProductFile| {
            file.products
        })?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

        info!(
            offers = offers.len(),
            dosages = dosages.len(),
            products = products.len(),
            "Knowledge base loaded"
        );
        Ok(Self {
            offers,
            dosages,
            products,
        })
    }

    /// Finds a product by exact name, then case-insensitively.
    pub fn find_product(&self, name: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.name == name)
            .or_else(|| {
                self.products
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
            })
    }
}

/// Reads every YAML or JSON file in a directory (sorted by file name) and
/// extracts its payload.
fn load_files<P, F, E, T>(dir_path: P, extract: E) -> Result<Vec<T>>
where
    P: AsRef<Path>,
    F: DeserializeOwned, // The file wrapper struct (e.g., OfferFile)
    E: Fn(F) -> T,
{
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut loaded = Vec::new();
    for path in paths {
        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
        let wrapper: F = match extension {
            "yaml" | "yml" => {
                let content = fs::read_to_string(&path)?;
                serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse YAML from {:?}", path))?
            }
            "json" => {
                let content = fs::read_to_string(&path)?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON from {:?}", path))?
            }
            _ => continue,
        };
        loaded.push(extract(wrapper));
    }
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("dosewise_kb_{}_{}", name, std::process::id()));
        for sub in ["offers", "dosages", "products"] {
            fs::create_dir_all(dir.join(sub)).unwrap();
        }
        dir
    }

    #[test]
    fn loads_mixed_yaml_and_json_files() {
        let dir = scratch_dir("mixed");
        fs::write(
            dir.join("offers/caffeine.yaml"),
            "schema_version: \"1.0\"\noffers:\n  - ingredient_name: Caffeine Anhydrous\n    cost: 9.99\n    total_quantity: 20\n    unit: g\n",
        )
        .unwrap();
        fs::write(
            dir.join("dosages/stimulants.json"),
            r#"{"schema_version": "1.0", "dosages": {"Caffeine Anhydrous": {"min": 100, "optimal": 200, "max": 400, "unit": "mg"}}}"#,
        )
        .unwrap();
        fs::write(
            dir.join("products/pre_workouts.yml"),
            "schema_version: \"1.0\"\nproducts:\n  - name: Example Pre-Workout\n    cost: 39.99\n    servings: 30\n    ingredients:\n      - name: Caffeine Anhydrous\n        amount: 200\n        unit: mg\n",
        )
        .unwrap();
        fs::write(dir.join("products/README.txt"), "ignored").unwrap();

        let kb = KnowledgeBase::load(dir.to_str().unwrap()).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(kb.offers.len(), 1);
        assert_eq!(kb.dosages.len(), 1);
        assert_eq!(kb.products.len(), 1);
        assert!(kb.find_product("example pre-workout").is_some());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = std::env::temp_dir().join(format!("dosewise_kb_absent_{}", std::process::id()));
        assert!(KnowledgeBase::load(dir.to_str().unwrap()).is_err());
    }
}
