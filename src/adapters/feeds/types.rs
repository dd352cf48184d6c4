//! Bitquery GraphQL Request/Response Types
//!
//! Serde model of the `Solana.DEXTrades` query. Every field is optional
//! so a single odd record never poisons the whole batch; rows are decoded
//! one by one and converted into port-level `FeedTrade`s.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ports::trade_feed::FeedTrade;

/// GraphQL request payload.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQlRequest {
    /// Query document.
    pub query: String,
}

/// Top-level GraphQL response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlResponse {
    /// Query result, absent on hard failures.
    pub data: Option<DataRoot>,
    /// Errors reported by the server.
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// A single GraphQL error.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    /// Error message.
    #[serde(default)]
    pub message: String,
}

/// `data` object.
#[derive(Debug, Clone, Deserialize)]
pub struct DataRoot {
    /// `Solana` namespace.
    #[serde(rename = "Solana")]
    pub solana: Option<SolanaRoot>,
}

/// `data.Solana` object.
#[derive(Debug, Clone, Deserialize)]
pub struct SolanaRoot {
    /// Raw trade rows, decoded individually.
    #[serde(rename = "DEXTrades")]
    pub dex_trades: Option<Vec<Value>>,
}

/// One `DEXTrades` row.
///
/// Nested nodes of the wrong shape decode as `None` and leaves stay raw
/// `Value`s, so a mistyped field only blanks itself.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DexTradeRow {
    #[serde(rename = "Trade", deserialize_with = "lenient_node")]
    pub trade: Option<TradeNode>,
}

/// `Trade` node of a row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TradeNode {
    #[serde(rename = "Dex", deserialize_with = "lenient_node")]
    pub dex: Option<DexNode>,
    #[serde(rename = "Buy", deserialize_with = "lenient_node")]
    pub buy: Option<BuyNode>,
}

/// `Trade.Dex` node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DexNode {
    #[serde(rename = "ProtocolName")]
    pub protocol_name: Option<Value>,
}

/// `Trade.Buy` node. Amounts arrive as strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuyNode {
    #[serde(rename = "AmountInUSD")]
    pub amount_in_usd: Option<Value>,
    #[serde(rename = "Price")]
    pub price: Option<Value>,
    #[serde(rename = "Currency", deserialize_with = "lenient_node")]
    pub currency: Option<CurrencyNode>,
}

/// `Trade.Buy.Currency` node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrencyNode {
    #[serde(rename = "Symbol")]
    pub symbol: Option<Value>,
    #[serde(rename = "Name")]
    pub name: Option<Value>,
    #[serde(rename = "MintAddress")]
    pub mint_address: Option<Value>,
}

/// Decode a nested node, yielding `None` when it has the wrong shape.
fn lenient_node<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl DexTradeRow {
    /// Decode a raw row; a row that is not an object becomes an empty
    /// record that the ingestor rejects.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Flatten into the port-level record.
    pub fn into_feed_trade(self) -> FeedTrade {
        let trade = self.trade.unwrap_or_default();
        let buy = trade.buy.unwrap_or_default();
        let currency = buy.currency.unwrap_or_default();

        FeedTrade {
            protocol: trade.dex.and_then(|d| lenient_string(d.protocol_name)),
            token_id: lenient_string(currency.mint_address),
            symbol: lenient_string(currency.symbol),
            name: lenient_string(currency.name),
            volume_usd: buy.amount_in_usd.as_ref().and_then(lenient_number),
            price: buy.price.as_ref().and_then(lenient_number),
        }
    }
}

/// Keep a JSON string, drop anything else.
pub fn lenient_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Interpret a JSON number or numeric string as `f64`.
pub fn lenient_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Build the DEXTrades query for the `limit` most recent trades.
pub fn dex_trades_query(limit: usize) -> String {
    format!(
        r"{{
  Solana {{
    DEXTrades(limit: {{count: {limit}}}, orderBy: {{descending: Block_Time}}) {{
      Trade {{
        Dex {{ ProtocolName }}
        Buy {{
          AmountInUSD
          Price
          Currency {{
            Symbol
            Name
            MintAddress
          }}
        }}
      }}
      Block {{ Time }}
    }}
  }}
}}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_with_string_amounts() {
        let row = DexTradeRow::from_value(json!({
            "Trade": {
                "Dex": { "ProtocolName": "PumpSwap" },
                "Buy": {
                    "AmountInUSD": "12.5",
                    "Price": 0.0003,
                    "Currency": { "Symbol": "WIF", "Name": "dogwifhat", "MintAddress": "mint1" }
                }
            },
            "Block": { "Time": "2024-01-01T00:00:00Z" }
        }));

        let trade = row.into_feed_trade();
        assert_eq!(trade.protocol.as_deref(), Some("PumpSwap"));
        assert_eq!(trade.token_id.as_deref(), Some("mint1"));
        assert_eq!(trade.volume_usd, Some(12.5));
        assert_eq!(trade.price, Some(0.0003));
    }

    #[test]
    fn test_row_missing_and_garbage_fields() {
        let row = DexTradeRow::from_value(json!({
            "Trade": {
                "Dex": { "ProtocolName": "pump" },
                "Buy": { "AmountInUSD": "n/a", "Currency": { "MintAddress": "mint2" } }
            }
        }));

        let trade = row.into_feed_trade();
        assert_eq!(trade.volume_usd, None);
        assert_eq!(trade.price, None);
        assert_eq!(trade.symbol, None);
    }

    #[test]
    fn test_mistyped_metadata_keeps_identity() {
        let trade = DexTradeRow::from_value(json!({
            "Trade": {
                "Dex": { "ProtocolName": "pump" },
                "Buy": {
                    "AmountInUSD": "5",
                    "Price": 1.0,
                    "Currency": { "Symbol": 42, "Name": ["x"], "MintAddress": "mint_ok" }
                }
            }
        }))
        .into_feed_trade();

        assert_eq!(trade.protocol.as_deref(), Some("pump"));
        assert_eq!(trade.token_id.as_deref(), Some("mint_ok"));
        assert_eq!(trade.symbol, None);
        assert_eq!(trade.name, None);
        assert_eq!(trade.volume_usd, Some(5.0));
        assert_eq!(trade.price, Some(1.0));
    }

    #[test]
    fn test_mistyped_nodes_only_blank_themselves() {
        let trade = DexTradeRow::from_value(json!({
            "Trade": {
                "Dex": "pump",
                "Buy": { "AmountInUSD": 2, "Currency": { "MintAddress": "mint3" } }
            }
        }))
        .into_feed_trade();

        assert_eq!(trade.protocol, None);
        assert_eq!(trade.token_id.as_deref(), Some("mint3"));
        assert_eq!(trade.volume_usd, Some(2.0));
    }

    #[test]
    fn test_undecodable_row_becomes_empty() {
        let trade = DexTradeRow::from_value(json!({ "Trade": 42 })).into_feed_trade();
        assert_eq!(trade, FeedTrade::default());
    }

    #[test]
    fn test_query_embeds_limit() {
        let query = dex_trades_query(100);
        assert!(query.contains("limit: {count: 100}"));
        assert!(query.contains("MintAddress"));
    }
}
