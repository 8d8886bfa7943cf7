//! Symbol map: which local store and quote currency hold a symbol's candles.
//!
//! Stored as a TOML file keyed by symbol:
//!
//! ```toml
//! [symbols.BTC]
//! exchange = "binance"
//! quote = "USDT"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::provider::DataError;

/// Storage location of one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSource {
    pub exchange: String,
    pub quote: String,
}

/// Symbol → source lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMap {
    pub symbols: BTreeMap<String, SymbolSource>,
}

impl SymbolMap {
    /// Load a symbol map from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a symbol map from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content).map_err(|e| DataError::SymbolMap(format!("parse symbol map: {e}")))
    }

    pub fn resolve(&self, symbol: &str) -> Result<&SymbolSource, DataError> {
        self.symbols
            .get(symbol)
            .ok_or_else(|| DataError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    pub fn insert(&mut self, symbol: &str, exchange: &str, quote: &str) {
        self.symbols.insert(
            symbol.to_string(),
            SymbolSource {
                exchange: exchange.to_string(),
                quote: quote.to_string(),
            },
        );
    }

    /// Entries from `other` replace entries with the same symbol.
    pub fn merge(&mut self, other: SymbolMap) {
        self.symbols.extend(other.symbols);
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Built-in crypto candle stores.
    pub fn default_crypto() -> Self {
        let mut map = Self {
            symbols: BTreeMap::new(),
        };
        for sym in ["BTC", "BCC", "ADA", "NEO", "BNB", "QTUM"] {
            map.insert(sym, "binance", "USDT");
        }
        for sym in ["XRP", "ETH", "EOS", "XLM", "LTC", "XMR", "DASH", "ETC"] {
            map.insert(sym, "kraken", "USD");
        }
        for sym in ["IOT", "TRX", "VEN", "OMG", "ZRX"] {
            map.insert(sym, "bitfinex", "USD");
        }
        map.insert("ZEC", "poloniex", "USDT");
        map
    }
}

impl Default for SymbolMap {
    fn default() -> Self {
        Self::default_crypto()
    }
}
