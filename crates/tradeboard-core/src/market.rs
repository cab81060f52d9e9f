//! Market domains.
//!
//! Every session, registry, history log and proposal schema belongs to exactly
//! one market domain.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::EngineError;

/// A top-level trading category with its own session registry and proposal schema.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MarketDomain {
    /// Overseas stock markets (US listings etc.)
    GlobalEquity,
    /// Cryptocurrency exchanges
    Crypto,
    /// Domestic stock market (KRX)
    DomesticEquity,
}

impl MarketDomain {
    /// All domains in their canonical order.
    pub fn all() -> Vec<MarketDomain> {
        MarketDomain::iter().collect()
    }

    /// Storage key used in persisted layouts, e.g. `"global-equity"`.
    pub fn key(&self) -> &'static str {
        self.into()
    }

    /// Parses a storage key, reporting unknown keys as `UnknownDomain`.
    pub fn from_key(key: &str) -> Result<Self, EngineError> {
        key.parse()
            .map_err(|_| EngineError::UnknownDomain(key.to_string()))
    }
}

/// One value per market domain, always fully populated.
#[derive(Debug, Clone, PartialEq)]
pub struct PerDomain<T> {
    global_equity: T,
    crypto: T,
    domestic_equity: T,
}

impl<T> PerDomain<T> {
    /// Builds a value for every domain.
    pub fn from_fn(mut f: impl FnMut(MarketDomain) -> T) -> Self {
        Self {
            global_equity: f(MarketDomain::GlobalEquity),
            crypto: f(MarketDomain::Crypto),
            domestic_equity: f(MarketDomain::DomesticEquity),
        }
    }

    pub fn get(&self, domain: MarketDomain) -> &T {
        match domain {
            MarketDomain::GlobalEquity => &self.global_equity,
            MarketDomain::Crypto => &self.crypto,
            MarketDomain::DomesticEquity => &self.domestic_equity,
        }
    }

    pub fn get_mut(&mut self, domain: MarketDomain) -> &mut T {
        match domain {
            MarketDomain::GlobalEquity => &mut self.global_equity,
            MarketDomain::Crypto => &mut self.crypto,
            MarketDomain::DomesticEquity => &mut self.domestic_equity,
        }
    }

    /// Values in canonical domain order.
    pub fn iter(&self) -> impl Iterator<Item = (MarketDomain, &T)> {
        [
            (MarketDomain::GlobalEquity, &self.global_equity),
            (MarketDomain::Crypto, &self.crypto),
            (MarketDomain::DomesticEquity, &self.domestic_equity),
        ]
        .into_iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|(_, value)| value)
    }
}
