//! Rust structs that represent the stored collections.
//!
//! These models define the structure of data as it is stored in and
//! retrieved from the record store, along with the declarative schema each
//! collection is validated against. They may differ from API request bodies.

use serde::{Deserialize, Serialize};
use walletfolio_adapters::{CollectionSchema, FieldSpec};

use crate::auth::Role;

pub const USERS: &str = "users";
pub const ADDRESSES: &str = "addresses";
pub const TOKENS: &str = "tokens";

/// How the keys of a wallet are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    SeedPhrase,
    Keystore,
    PrivateKey,
}

impl StorageType {
    pub const OPTIONS: [&'static str; 3] = ["seed_phrase", "keystore", "private_key"];
}

/// How a wallet is accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    HardwareWallet,
    MobileWallet,
    DesktopBrowserWallet,
    Multisig,
}

impl AccessType {
    pub const OPTIONS: [&'static str; 4] = [
        "hardware_wallet",
        "mobile_wallet",
        "desktop_browser_wallet",
        "multisig",
    ];

    pub const ALL: [AccessType; 4] = [
        AccessType::HardwareWallet,
        AccessType::MobileWallet,
        AccessType::DesktopBrowserWallet,
        AccessType::Multisig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HardwareWallet => "hardware_wallet",
            Self::MobileWallet => "mobile_wallet",
            Self::DesktopBrowserWallet => "desktop_browser_wallet",
            Self::Multisig => "multisig",
        }
    }

    /// `hardware_wallet` → `Hardware Wallet`.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::HardwareWallet => "Addresses secured by hardware devices",
            Self::MobileWallet => "Addresses from mobile wallets",
            Self::DesktopBrowserWallet => "Addresses from desktop browser wallets",
            Self::Multisig => "Multi-signature addresses",
        }
    }

    pub fn security_label(&self) -> &'static str {
        match self {
            Self::HardwareWallet => "Most Secure",
            Self::MobileWallet => "Medium Security",
            Self::DesktopBrowserWallet => "Basic Security",
            Self::Multisig => "Multi-Signature",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
}

/// A catalogued wallet address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: String,
    pub address: String,
    pub chain: String,
    pub storage_type: StorageType,
    pub access_type: AccessType,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Id of the owning user.
    pub owner: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalValue {
    pub value: f64,
    pub timestamp: String,
}

/// A token balance held at an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub name: String,
    pub ticker: String,
    pub amount: f64,
    /// Id of the holding address.
    pub address: String,
    #[serde(default)]
    pub historical_values: Vec<HistoricalValue>,
    pub created_at: String,
    pub updated_at: String,
}

impl Token {
    /// Value of the most recent historical entry.
    pub fn current_value(&self) -> Option<f64> {
        self.historical_values
            .iter()
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
            .map(|h| h.value)
    }
}

pub fn users_schema() -> CollectionSchema {
    CollectionSchema::new(
        USERS,
        vec![
            FieldSpec::email("email").required().unique(),
            FieldSpec::text("hash").required(),
            FieldSpec::select("role", &Role::OPTIONS)
                .required()
                .default_value(Role::User.as_str()),
        ],
    )
}

pub fn addresses_schema() -> CollectionSchema {
    CollectionSchema::new(
        ADDRESSES,
        vec![
            FieldSpec::text("address").required(),
            FieldSpec::text("chain").required(),
            FieldSpec::select("storageType", &StorageType::OPTIONS).required(),
            FieldSpec::select("accessType", &AccessType::OPTIONS).required(),
            FieldSpec::textarea("notes").default_value(""),
            FieldSpec::array("tags", vec![FieldSpec::text("tag")]).default_value(Vec::<serde_json::Value>::new()),
            FieldSpec::relationship("owner", USERS).required(),
        ],
    )
}

pub fn tokens_schema() -> CollectionSchema {
    CollectionSchema::new(
        TOKENS,
        vec![
            FieldSpec::text("name").required(),
            FieldSpec::text("ticker").required(),
            FieldSpec::number("amount").required(),
            FieldSpec::relationship("address", ADDRESSES).required(),
            FieldSpec::array(
                "historicalValues",
                vec![
                    FieldSpec::number("value").required(),
                    FieldSpec::date("timestamp").required(),
                ],
            )
            .default_value(Vec::<serde_json::Value>::new()),
        ],
    )
}

/// Every collection the application registers with the store.
pub fn collections() -> Vec<CollectionSchema> {
    vec![users_schema(), addresses_schema(), tokens_schema()]
}
