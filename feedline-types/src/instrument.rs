//! Instrument identity as requested from and validated by the gateway.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Product type code understood by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductType {
    /// Equity ("STK").
    Stock,
    /// Future ("FUT").
    Future,
    /// Option ("OPT").
    Option,
    /// Future option ("FOP").
    FutureOption,
    /// Currency pair ("CASH").
    Forex,
    /// Index ("IND").
    Index,
    /// Bond ("BOND").
    Bond,
    /// Any other code, kept verbatim.
    Other(String),
}

impl ProductType {
    /// Gateway code for this product type.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Stock => "STK",
            Self::Future => "FUT",
            Self::Option => "OPT",
            Self::FutureOption => "FOP",
            Self::Forex => "CASH",
            Self::Index => "IND",
            Self::Bond => "BOND",
            Self::Other(code) => code,
        }
    }

    /// Parse a gateway code; unknown codes become `Other`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "STK" => Self::Stock,
            "FUT" => Self::Future,
            "OPT" => Self::Option,
            "FOP" => Self::FutureOption,
            "CASH" => Self::Forex,
            "IND" => Self::Index,
            "BOND" => Self::Bond,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ProductType {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<ProductType> for String {
    fn from(p: ProductType) -> Self {
        p.code().to_string()
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Normalized identity of a tradable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentDescriptor {
    /// Underlying symbol, e.g. "ABC" or "ES".
    pub symbol: String,
    /// Product type.
    pub product_type: ProductType,
    /// Routing venue / exchange.
    pub venue: String,
    /// Trading class; futures use their symbol.
    pub trading_class: String,
    /// Last trade date or contract month, empty when not applicable.
    pub contract_month: String,
    /// Venue-local symbol, e.g. "ESZ6".
    pub local_symbol: String,
}

impl InstrumentDescriptor {
    /// Build a descriptor from the three fields a lookup needs and normalize it.
    pub fn new(
        symbol: impl Into<String>,
        product_type: ProductType,
        venue: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            product_type,
            venue: venue.into(),
            trading_class: String::new(),
            contract_month: String::new(),
            local_symbol: String::new(),
        }
        .normalized()
    }

    /// Apply the gateway's normalization rules.
    ///
    /// A future's trading class is always its symbol; every other product
    /// type keeps the trading class it was given.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.product_type == ProductType::Future {
            self.trading_class.clone_from(&self.symbol);
        }
        self
    }

    /// Symbol used to label replies: the local symbol when the gateway
    /// supplied one, the plain symbol otherwise.
    #[must_use]
    pub fn display_symbol(&self) -> &str {
        if self.local_symbol.is_empty() {
            &self.symbol
        } else {
            &self.local_symbol
        }
    }
}

impl fmt::Display for InstrumentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @{}", self.symbol, self.product_type, self.venue)?;
        if !self.local_symbol.is_empty() {
            write!(f, " ({})", self.local_symbol)?;
        }
        Ok(())
    }
}

/// Nested description block of a reference-data record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecurityDescription {
    /// Venue the instrument is requested on.
    #[serde(rename = "Exchange")]
    pub exchange: String,
}

/// One row of the reference-data universe held by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRecord {
    /// Instrument symbol.
    #[serde(rename = "Symbol")]
    pub symbol: String,
    /// Product type code.
    #[serde(rename = "ProductType")]
    pub product_type: ProductType,
    /// Venue information.
    #[serde(rename = "Description", default)]
    pub description: SecurityDescription,
    /// Whether the client should subscribe to this instrument.
    #[serde(rename = "SubscriptionEnabled", default)]
    pub subscription_enabled: bool,
}

impl SecurityRecord {
    /// Build a record for tests and fixtures.
    pub fn new(
        symbol: impl Into<String>,
        product_type: ProductType,
        exchange: impl Into<String>,
        subscription_enabled: bool,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            product_type,
            description: SecurityDescription {
                exchange: exchange.into(),
            },
            subscription_enabled,
        }
    }

    /// Normalized descriptor to look this record up with.
    #[must_use]
    pub fn descriptor(&self) -> InstrumentDescriptor {
        InstrumentDescriptor::new(
            self.symbol.clone(),
            self.product_type.clone(),
            self.description.exchange.clone(),
        )
    }
}

/// Contract details returned by the gateway for a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDetails {
    /// The contract as the gateway knows it.
    pub contract: InstrumentDescriptor,
    /// Market name reported by the gateway.
    pub market_name: String,
}

impl ContractDetails {
    /// Whether these details answer a lookup for `requested`.
    ///
    /// Either the returned symbol or the market name must equal the requested symbol.
    #[must_use]
    pub fn matches(&self, requested: &InstrumentDescriptor) -> bool {
        self.contract.symbol == requested.symbol || self.market_name == requested.symbol
    }

    /// Validated descriptor built from the returned contract.
    #[must_use]
    pub fn validated(&self) -> InstrumentDescriptor {
        self.contract.clone().normalized()
    }
}
