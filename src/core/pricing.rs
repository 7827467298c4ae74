use crate::config::toml_config::PricingConfig;
use crate::domain::model::{bundle_name, OverclockDecision, PriceBundle, RamGeneration};
use crate::utils::error::{AdvisorError, Result};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct PriceRow {
    pub bundle_name: String,
    pub ddr4: u32,
    pub ddr5: u32,
}

/// 以 (RAM 世代, 組合名稱) 為鍵的靜態價目表
#[derive(Debug, Clone)]
pub struct PriceTable {
    version: String,
    effective_from: NaiveDate,
    currency: String,
    rows: Vec<PriceRow>,
    prices: HashMap<(RamGeneration, String), u32>,
    unsold: HashSet<String>,
}

impl PriceTable {
    pub fn from_config(config: &PricingConfig) -> Self {
        let mut rows = Vec::with_capacity(config.bundles.len());
        let mut prices = HashMap::new();

        for bundle in &config.bundles {
            let name = bundle_name(&bundle.components);
            for generation in [RamGeneration::Ddr4, RamGeneration::Ddr5] {
                if let Some(price) = bundle.price_for(generation) {
                    prices.insert((generation, name.clone()), price);
                }
            }
            rows.push(PriceRow {
                bundle_name: name,
                ddr4: bundle.ddr4,
                ddr5: bundle.ddr5,
            });
        }

        let unsold = config
            .unsold
            .iter()
            .map(|components| bundle_name(components))
            .collect();

        Self {
            version: config.version.clone(),
            effective_from: config.effective_from,
            currency: config.currency.clone(),
            rows,
            prices,
            unsold,
        }
    }

    pub fn price(&self, generation: RamGeneration, bundle: &str) -> Option<u32> {
        self.prices.get(&(generation, bundle.to_string())).copied()
    }

    pub fn is_unsold(&self, bundle: &str) -> bool {
        self.unsold.contains(bundle)
    }

    pub fn unsold(&self) -> impl Iterator<Item = &str> {
        self.unsold.iter().map(|name| name.as_str())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn effective_from(&self) -> NaiveDate {
        self.effective_from
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Rows in configuration order.
    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }
}

pub struct PricingResolver<'a> {
    table: &'a PriceTable,
}

impl<'a> PricingResolver<'a> {
    pub fn new(table: &'a PriceTable) -> Self {
        Self { table }
    }

    /// `Ok(None)` when nothing is eligible or the subset is declared unsold.
    /// A missing table entry is a deployment error.
    pub fn resolve(
        &self,
        decision: &OverclockDecision,
        ram_generation: RamGeneration,
    ) -> Result<Option<PriceBundle>> {
        if decision.is_empty() {
            return Ok(None);
        }

        let name = bundle_name(&decision.eligible_components);
        if self.table.is_unsold(&name) {
            tracing::info!("Bundle '{}' is not sold on its own", name);
            return Ok(None);
        }

        let Some(price_amount) = self.table.price(ram_generation, &name) else {
            tracing::error!(
                "🚨 Price table {} has no entry for bundle '{}' ({})",
                self.table.version(),
                name,
                ram_generation
            );
            return Err(AdvisorError::PricingConfigurationMissing {
                bundle: name,
                ram_generation: ram_generation.to_string(),
            });
        };

        Ok(Some(PriceBundle {
            bundle_name: name,
            price_amount,
            installments_allowed: ram_generation == RamGeneration::Ddr5,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::AdvisorConfig;
    use crate::domain::model::Component;
    use std::collections::BTreeSet;

    fn table() -> PriceTable {
        PriceTable::from_config(&AdvisorConfig::builtin().unwrap().pricing)
    }

    fn decision(components: &[Component]) -> OverclockDecision {
        OverclockDecision::from_components(components.iter().copied().collect::<BTreeSet<_>>())
    }

    #[test]
    fn test_canonical_prices() {
        let table = table();
        let expected = [
            (vec![Component::Gpu], 30, 135),
            (vec![Component::Cpu, Component::Ram], 65, 155),
            (vec![Component::Cpu, Component::Gpu], 75, 175),
            (vec![Component::Ram, Component::Gpu], 55, 135),
            (vec![Component::Cpu, Component::Ram, Component::Gpu], 85, 195),
            (vec![Component::Cpu], 20, 40),
        ];

        let resolver = PricingResolver::new(&table);
        for (components, ddr4, ddr5) in expected {
            let d = decision(&components);
            let four = resolver.resolve(&d, RamGeneration::Ddr4).unwrap().unwrap();
            let five = resolver.resolve(&d, RamGeneration::Ddr5).unwrap().unwrap();

            assert_eq!(four.price_amount, ddr4, "{}", four.bundle_name);
            assert_eq!(five.price_amount, ddr5, "{}", five.bundle_name);
            assert!(!four.installments_allowed);
            assert!(five.installments_allowed);
        }
    }

    #[test]
    fn test_empty_decision_has_no_bundle() {
        let table = table();
        let resolver = PricingResolver::new(&table);
        assert_eq!(resolver.resolve(&decision(&[]), RamGeneration::Ddr4).unwrap(), None);
        assert_eq!(
            resolver
                .resolve(&OverclockDecision::laptop(), RamGeneration::Ddr5)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_unsold_subset_has_no_bundle() {
        let table = table();
        let resolver = PricingResolver::new(&table);

        assert!(table.is_unsold("RAM"));
        assert_eq!(
            resolver
                .resolve(&decision(&[Component::Ram]), RamGeneration::Ddr5)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_missing_entry_fails_loudly() {
        let mut pricing = AdvisorConfig::builtin().unwrap().pricing;
        pricing
            .bundles
            .retain(|b| bundle_name(&b.components) != "CPU + RAM");
        let table = PriceTable::from_config(&pricing);
        let resolver = PricingResolver::new(&table);

        let err = resolver
            .resolve(&decision(&[Component::Ram, Component::Cpu]), RamGeneration::Ddr4)
            .unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::PricingConfigurationMissing { ref bundle, .. } if bundle == "CPU + RAM"
        ));

        assert!(resolver
            .resolve(&decision(&[Component::Gpu]), RamGeneration::Unknown)
            .is_err());
    }

    #[test]
    fn test_table_metadata() {
        let table = table();
        assert_eq!(table.version(), "2024-09-canonical");
        assert_eq!(table.currency(), "€");
        assert_eq!(table.rows()[0].bundle_name, "GPU");
        assert_eq!(table.rows().len(), 6);
    }
}
