//! Deterministic reference data used across tests.

use feedline_core::{Bar, ContractDetails, InstrumentDescriptor, ProductType, SecurityRecord};

/// The default universe: two enabled instruments and one disabled.
#[must_use]
pub fn securities() -> Vec<SecurityRecord> {
    vec![
        SecurityRecord::new("ABC", ProductType::Stock, "NASDAQ", true),
        SecurityRecord::new("ES", ProductType::Future, "GLOBEX", true),
        SecurityRecord::new("XYZ", ProductType::Stock, "NYSE", false),
    ]
}

/// Contract details the gateway returns for a fixture symbol.
#[must_use]
pub fn contract_for(symbol: &str) -> ContractDetails {
    match symbol {
        "ES" => ContractDetails {
            contract: InstrumentDescriptor {
                symbol: "ES".into(),
                product_type: ProductType::Future,
                venue: "GLOBEX".into(),
                trading_class: "ES".into(),
                contract_month: "202612".into(),
                local_symbol: "ESZ6".into(),
            },
            market_name: "ES".into(),
        },
        other => ContractDetails {
            contract: InstrumentDescriptor {
                symbol: other.into(),
                product_type: ProductType::Stock,
                venue: "NASDAQ".into(),
                trading_class: "NMS".into(),
                contract_month: String::new(),
                local_symbol: other.into(),
            },
            market_name: "NMS".into(),
        },
    }
}

/// Two daily bars.
#[must_use]
pub fn bars() -> Vec<Bar> {
    vec![
        Bar {
            date: "20240104".into(),
            open: 10.5,
            high: 11.25,
            low: 10.1,
            close: 11.0,
            volume: 12_000,
            bar_count: 340,
        },
        Bar {
            date: "20240105".into(),
            open: 11.0,
            high: 11.8,
            low: 10.9,
            close: 11.6,
            volume: 9_500,
            bar_count: 275,
        },
    ]
}
