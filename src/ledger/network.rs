//! Ledger network table.

use serde::{Deserialize, Serialize};

/// Target ledger network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

/// Connection details for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub passphrase: &'static str,
    pub rpc_url: &'static str,
    pub horizon_url: &'static str,
    /// Deployed loyalty token contract, if any
    pub token_contract: Option<&'static str>,
}

const TESTNET: NetworkConfig = NetworkConfig {
    passphrase: "Test SDF Network ; September 2015",
    rpc_url: "https://soroban-testnet.stellar.org",
    horizon_url: "https://horizon-testnet.stellar.org",
    token_contract: Some("CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQAHHAGK3HH4"),
};

const MAINNET: NetworkConfig = NetworkConfig {
    passphrase: "Public Global Stellar Network ; September 2015",
    rpc_url: "https://soroban-mainnet.stellar.org",
    horizon_url: "https://horizon.stellar.org",
    token_contract: None,
};

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Some(Network::Testnet),
            "mainnet" | "public" => Some(Network::Mainnet),
            _ => None,
        }
    }

    /// Identifier embedded in merchant QR payloads.
    pub fn network_id(&self) -> &'static str {
        match self {
            Network::Testnet => "stellar_testnet",
            Network::Mainnet => "stellar_mainnet",
        }
    }

    pub fn from_network_id(id: &str) -> Option<Self> {
        match id {
            "stellar_testnet" => Some(Network::Testnet),
            "stellar_mainnet" => Some(Network::Mainnet),
            _ => None,
        }
    }

    pub fn config(&self) -> &'static NetworkConfig {
        match self {
            Network::Testnet => &TESTNET,
            Network::Mainnet => &MAINNET,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contract addresses are `C` followed by 55 uppercase base32 characters.
pub fn is_valid_contract_address(address: &str) -> bool {
    address.len() == 56
        && address.starts_with('C')
        && address
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
