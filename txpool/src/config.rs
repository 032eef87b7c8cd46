use ela_core::{Fixed64, Uint168, Uint256};
use serde::{Deserialize, Serialize};

/// chain parameters the validators and the pool check transactions against
///
/// every field has a default so a configuration file only needs to list
/// what differs from the main network.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub struct ChainParams {
    /// the only asset outputs may carry
    #[serde(default)]
    pub native_asset_id: Uint256,
    #[serde(default = "default_native_asset_precision")]
    pub native_asset_precision: u8,

    /// receives the first output of every coinbase
    #[serde(default)]
    pub foundation: Uint168,
    /// minimal share of the coinbase rewards, in percent, paid to the foundation
    #[serde(default = "default_foundation_reward_percent")]
    pub foundation_reward_percent: u8,

    /// outputs of this program can never be spent
    #[serde(default = "default_destruction_address")]
    pub destruction_address: Uint168,

    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,
    #[serde(default = "default_min_tx_fee")]
    pub min_tx_fee: Fixed64,
    #[serde(default = "default_min_cross_chain_tx_fee")]
    pub min_cross_chain_tx_fee: Fixed64,

    /// number of blocks before a coinbase output can be spent
    #[serde(default = "default_coinbase_maturity")]
    pub coinbase_maturity: u32,

    #[serde(default)]
    pub min_asset_precision: u8,
    #[serde(default = "default_native_asset_precision")]
    pub max_asset_precision: u8,

    /// depth of the accepted transactions notification channel
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

fn default_native_asset_precision() -> u8 {
    8
}

fn default_foundation_reward_percent() -> u8 {
    30
}

/// `ELANULLXXXXXXXXXXXXXXXXXXXXXYvs3rr`
fn default_destruction_address() -> Uint168 {
    Uint168::new([
        33, 32, 254, 229, 215, 235, 62, 92, 125, 49, 151, 254, 207, 108, 13, 227, 15, 136, 154,
        206, 247,
    ])
}

fn default_max_block_size() -> usize {
    8_000_000
}

fn default_min_tx_fee() -> Fixed64 {
    Fixed64::new(100)
}

fn default_min_cross_chain_tx_fee() -> Fixed64 {
    Fixed64::new(10_000)
}

fn default_coinbase_maturity() -> u32 {
    100
}

fn default_notification_capacity() -> usize {
    1024
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            native_asset_id: Uint256::default(),
            native_asset_precision: default_native_asset_precision(),
            foundation: Uint168::default(),
            foundation_reward_percent: default_foundation_reward_percent(),
            destruction_address: default_destruction_address(),
            max_block_size: default_max_block_size(),
            min_tx_fee: default_min_tx_fee(),
            min_cross_chain_tx_fee: default_min_cross_chain_tx_fee(),
            coinbase_maturity: default_coinbase_maturity(),
            min_asset_precision: 0,
            max_asset_precision: default_native_asset_precision(),
            notification_capacity: default_notification_capacity(),
        }
    }
}

impl ChainParams {
    /// main network parameters with the given native asset and foundation
    pub fn new(native_asset_id: Uint256, foundation: Uint168) -> Self {
        Self {
            native_asset_id,
            foundation,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deps::serde_json;

    #[test]
    fn defaults_from_empty_config() {
        let params: ChainParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.max_block_size, 8_000_000);
        assert_eq!(params.min_tx_fee, Fixed64::new(100));
        assert_eq!(params.min_cross_chain_tx_fee, Fixed64::new(10_000));
        assert_eq!(params.coinbase_maturity, 100);
        assert_eq!(params.foundation_reward_percent, 30);
        assert_eq!(params.max_asset_precision, 8);
        assert_eq!(params.destruction_address.prefix(), 0x21);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<ChainParams>(r#"{"max_size": 1}"#).is_err());
    }

    #[test]
    fn partial_config() {
        let params: ChainParams =
            serde_json::from_str(r#"{"coinbase_maturity": 10, "min_tx_fee": 5}"#).unwrap();
        assert_eq!(params.coinbase_maturity, 10);
        assert_eq!(params.min_tx_fee, Fixed64::new(5));
        assert_eq!(params.max_block_size, 8_000_000);
    }
}
