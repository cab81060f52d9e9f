//! Trade proposals.
//!
//! Each market domain has its own proposal shape. The variants never share
//! fields, and a proposal can only be attached to a session of the domain it
//! was built for.

use serde::{Deserialize, Serialize};

use crate::market::MarketDomain;

/// Direction of a proposed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

/// Proposal for an overseas stock, priced in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityProposal {
    pub ticker: String,
    /// Listing exchange such as "NASDAQ" or "NYSE"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    pub action: TradeAction,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_usd: Option<f64>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl EquityProposal {
    pub fn new(ticker: impl Into<String>, action: TradeAction, quantity: u32) -> Self {
        Self {
            ticker: ticker.into(),
            exchange: None,
            action,
            quantity,
            limit_price_usd: None,
            stop_loss_usd: None,
            take_profit_usd: None,
            rationale: String::new(),
            confidence: None,
        }
    }
}

/// Proposal for a cryptocurrency market pair, sized in quote currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoProposal {
    /// Market pair such as "KRW-BTC"
    pub market: String,
    pub action: TradeAction,
    /// Order size expressed in the quote currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl CryptoProposal {
    pub fn new(market: impl Into<String>, action: TradeAction) -> Self {
        Self {
            market: market.into(),
            action,
            order_amount: None,
            limit_price: None,
            stop_loss: None,
            take_profit: None,
            rationale: String::new(),
            confidence: None,
        }
    }
}

/// Proposal for a domestic (KRX) stock, priced in whole won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomesticEquityProposal {
    /// Six-digit stock code such as "005930"
    pub stock_code: String,
    #[serde(default)]
    pub stock_name: String,
    pub action: TradeAction,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_price_krw: Option<i64>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl DomesticEquityProposal {
    pub fn new(stock_code: impl Into<String>, action: TradeAction, quantity: u32) -> Self {
        Self {
            stock_code: stock_code.into(),
            stock_name: String::new(),
            action,
            quantity,
            limit_price_krw: None,
            rationale: String::new(),
            confidence: None,
        }
    }
}

/// A trade proposal, typed by the market domain it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "market", content = "proposal", rename_all = "kebab-case")]
pub enum TradeProposal {
    GlobalEquity(EquityProposal),
    Crypto(CryptoProposal),
    DomesticEquity(DomesticEquityProposal),
}

impl TradeProposal {
    /// The only domain this proposal may be attached to.
    pub fn market_domain(&self) -> MarketDomain {
        match self {
            TradeProposal::GlobalEquity(_) => MarketDomain::GlobalEquity,
            TradeProposal::Crypto(_) => MarketDomain::Crypto,
            TradeProposal::DomesticEquity(_) => MarketDomain::DomesticEquity,
        }
    }

    pub fn action(&self) -> TradeAction {
        match self {
            TradeProposal::GlobalEquity(p) => p.action,
            TradeProposal::Crypto(p) => p.action,
            TradeProposal::DomesticEquity(p) => p.action,
        }
    }

    /// Instrument the proposal trades.
    pub fn instrument(&self) -> &str {
        match self {
            TradeProposal::GlobalEquity(p) => &p.ticker,
            TradeProposal::Crypto(p) => &p.market,
            TradeProposal::DomesticEquity(p) => &p.stock_code,
        }
    }
}
