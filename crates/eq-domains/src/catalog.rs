//! Built-in domain catalog.
//!
//! A small set of ready-made domains with schemas and sample queries so
//! the console is usable before anyone writes a custom profile.

use crate::DomainConfig;
use serde_json::json;

pub fn builtin_domains() -> Vec<DomainConfig> {
    vec![
        DomainConfig {
            name: "Forestry".into(),
            domain: "forestry".into(),
            description: "Comprehensive data on sustainable forest management, timber \
                          production, wildlife habitat, and carbon sequestration in forestry."
                .into(),
            sample_queries: vec![
                "What is the total volume of timber sold by each salesperson?".into(),
                "Show me the timber sales data for the last quarter".into(),
                "Which regions have the highest timber production?".into(),
                "Find the average sale price per cubic meter of timber".into(),
            ],
            schema: json!({
                "database_schema": {
                    "salesperson": {
                        "columns": [
                            {"name": "salesperson_id", "type": "INT"},
                            {"name": "name", "type": "TEXT"},
                            {"name": "region", "type": "TEXT"}
                        ]
                    },
                    "timber_sales": {
                        "columns": [
                            {"name": "sales_id", "type": "INT"},
                            {"name": "salesperson_id", "type": "INT"},
                            {"name": "volume", "type": "REAL"},
                            {"name": "sale_date", "type": "DATE"}
                        ]
                    }
                }
            }),
        },
        DomainConfig {
            name: "Defense Industry".into(),
            domain: "defense industry".into(),
            description: "Defense contract data, military equipment maintenance, threat \
                          intelligence metrics, and veteran employment stats."
                .into(),
            sample_queries: vec![
                "List all the unique equipment types and their maintenance frequency".into(),
                "Which equipment requires the most frequent maintenance?".into(),
                "Show me the maintenance schedule for all equipment types".into(),
                "Find equipment with maintenance frequency above average".into(),
            ],
            schema: json!({
                "database_schema": {
                    "equipment_maintenance": {
                        "columns": [
                            {"name": "equipment_type", "type": "VARCHAR(255)"},
                            {"name": "maintenance_frequency", "type": "INT"}
                        ]
                    }
                }
            }),
        },
        DomainConfig {
            name: "Marine Biology".into(),
            domain: "marine biology".into(),
            description: "Comprehensive data on marine species, oceanography, conservation \
                          efforts, and climate change impacts in marine biology."
                .into(),
            sample_queries: vec![
                "How many marine species are found in the Southern Ocean?".into(),
                "List all species found in tropical waters".into(),
                "Show me the most common marine species by location".into(),
                "Which locations have the highest biodiversity?".into(),
            ],
            schema: json!({
                "database_schema": {
                    "marine_species": {
                        "columns": [
                            {"name": "name", "type": "VARCHAR(50)"},
                            {"name": "common_name", "type": "VARCHAR(50)"},
                            {"name": "location", "type": "VARCHAR(50)"}
                        ]
                    }
                }
            }),
        },
        DomainConfig {
            name: "Financial Services".into(),
            domain: "financial services".into(),
            description: "Detailed financial data including investment strategies, risk \
                          management, fraud detection, customer analytics, and regulatory \
                          compliance."
                .into(),
            sample_queries: vec![
                "What is the total trade value and average price for each trader?".into(),
                "Show me the top performing stocks by volume".into(),
                "Find all trades above $10,000 in the last month".into(),
                "Which traders have the highest total trade values?".into(),
            ],
            schema: json!({
                "database_schema": {
                    "trade_history": {
                        "columns": [
                            {"name": "id", "type": "INT"},
                            {"name": "trader_id", "type": "INT"},
                            {"name": "stock", "type": "VARCHAR(255)"},
                            {"name": "price", "type": "DECIMAL(5)"},
                            {"name": "quantity", "type": "INT"},
                            {"name": "trade_time", "type": "TIMESTAMP"}
                        ]
                    }
                }
            }),
        },
        DomainConfig {
            name: "Energy".into(),
            domain: "energy".into(),
            description: "Energy market data covering renewable energy sources, energy \
                          storage, carbon pricing, and energy efficiency."
                .into(),
            sample_queries: vec![
                "Find the energy efficiency upgrades with the highest cost".into(),
                "Show me all upgrade types and their average costs".into(),
                "Which upgrades cost less than $5,000?".into(),
                "List the most expensive energy efficiency upgrades".into(),
            ],
            schema: json!({
                "database_schema": {
                    "upgrades": {
                        "columns": [
                            {"name": "id", "type": "INT"},
                            {"name": "cost", "type": "FLOAT"},
                            {"name": "type", "type": "TEXT"}
                        ]
                    }
                }
            }),
        },
        DomainConfig {
            name: "Aquaculture".into(),
            domain: "aquaculture".into(),
            description: "Aquatic farming data, fish stock management, ocean health \
                          metrics, and sustainable seafood trends."
                .into(),
            sample_queries: vec![
                "What is the average water temperature per species?".into(),
                "Show me temperature readings from the last week".into(),
            ],
            schema: json!({
                "database_schema": {
                    "SpeciesWaterTemp": {
                        "columns": [
                            {"name": "SpeciesID", "type": "int"},
                            {"name": "Date", "type": "date"},
                            {"name": "WaterTemp", "type": "float"}
                        ]
                    }
                }
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_non_empty_and_well_formed() {
        let domains = builtin_domains();
        assert!(domains.len() >= 4);
        for config in &domains {
            assert!(!config.name.is_empty());
            assert!(!config.description.is_empty());
            assert!(config.schema.get("database_schema").is_some(), "{}", config.name);
        }
    }

    #[test]
    fn domain_names_are_unique() {
        let domains = builtin_domains();
        let mut names: Vec<_> = domains.iter().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), domains.len());
    }
}
