//! Portfolio aggregation over the addresses and tokens a requester can see.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::database::{AccessType, Address, Token};

/// Addresses sharing one access type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressGroup {
    pub access_type: AccessType,
    pub title: String,
    pub description: &'static str,
    pub security: &'static str,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_addresses: usize,
    /// Share of addresses on hardware wallets, as a whole percent.
    pub hardware_protected_percent: u32,
    pub multisig_count: usize,
}

/// Summed holdings of one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub ticker: String,
    pub name: String,
    pub amount: f64,
    pub value: f64,
    /// Percent of the total portfolio value.
    pub distribution: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub overview: Overview,
    pub groups: Vec<AddressGroup>,
    pub holdings: Vec<Holding>,
    pub total_value: f64,
}

/// Groups addresses by access type, most secure first. Empty groups are
/// left out.
pub fn group_by_access(addresses: &[Address]) -> Vec<AddressGroup> {
    AccessType::ALL
        .iter()
        .filter_map(|access| {
            let members = addresses
                .iter()
                .filter(|a| a.access_type == *access)
                .cloned()
                .collect::<Vec<_>>();
            (!members.is_empty()).then(|| AddressGroup {
                access_type: *access,
                title: access.title(),
                description: access.description(),
                security: access.security_label(),
                addresses: members,
            })
        })
        .collect()
}

pub fn overview(addresses: &[Address]) -> Overview {
    let total = addresses.len();
    let count = |access: AccessType| addresses.iter().filter(|a| a.access_type == access).count();
    let hardware = count(AccessType::HardwareWallet);
    let hardware_protected_percent = if total == 0 {
        0
    } else {
        (hardware as f64 / total as f64 * 100.0).round() as u32
    };
    Overview {
        total_addresses: total,
        hardware_protected_percent,
        multisig_count: count(AccessType::Multisig),
    }
}

/// Per-ticker holdings, ordered by ticker, and their total value.
pub fn holdings(tokens: &[Token]) -> (Vec<Holding>, f64) {
    let mut by_ticker: BTreeMap<&str, Holding> = BTreeMap::new();
    for token in tokens {
        let entry = by_ticker.entry(token.ticker.as_str()).or_insert_with(|| Holding {
            ticker: token.ticker.clone(),
            name: token.name.clone(),
            amount: 0.0,
            value: 0.0,
            distribution: 0.0,
        });
        entry.amount += token.amount;
        entry.value += token.current_value().unwrap_or(0.0);
    }

    let total: f64 = by_ticker.values().map(|h| h.value).sum();
    let holdings = by_ticker
        .into_values()
        .map(|mut holding| {
            if total > 0.0 {
                holding.distribution = holding.value / total * 100.0;
            }
            holding
        })
        .collect();
    (holdings, total)
}

pub fn summarize(addresses: &[Address], tokens: &[Token]) -> Portfolio {
    let (holdings, total_value) = holdings(tokens);
    Portfolio {
        overview: overview(addresses),
        groups: group_by_access(addresses),
        holdings,
        total_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{HistoricalValue, StorageType};

    fn address(id: &str, access: AccessType) -> Address {
        Address {
            id: id.into(),
            address: format!("0x{id}"),
            chain: "ethereum".into(),
            storage_type: StorageType::Keystore,
            access_type: access,
            notes: String::new(),
            tags: Vec::new(),
            owner: "u1".into(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn token(ticker: &str, amount: f64, values: &[(f64, &str)]) -> Token {
        Token {
            id: format!("{ticker}-{amount}"),
            name: ticker.to_lowercase(),
            ticker: ticker.into(),
            amount,
            address: "a1".into(),
            historical_values: values
                .iter()
                .map(|(value, timestamp)| HistoricalValue {
                    value: *value,
                    timestamp: timestamp.to_string(),
                })
                .collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_groups_follow_security_order() {
        let addresses = vec![
            address("m", AccessType::Multisig),
            address("h", AccessType::HardwareWallet),
            address("h2", AccessType::HardwareWallet),
        ];
        let groups = group_by_access(&addresses);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Hardware Wallet");
        assert_eq!(groups[0].security, "Most Secure");
        assert_eq!(groups[0].addresses.len(), 2);
        assert_eq!(groups[1].access_type, AccessType::Multisig);
    }

    #[test]
    fn test_overview_percentages() {
        let addresses = vec![
            address("h", AccessType::HardwareWallet),
            address("m", AccessType::MobileWallet),
            address("d", AccessType::DesktopBrowserWallet),
        ];
        assert_eq!(
            overview(&addresses),
            Overview {
                total_addresses: 3,
                hardware_protected_percent: 33,
                multisig_count: 0,
            }
        );
        assert_eq!(overview(&[]).hardware_protected_percent, 0);
    }

    #[test]
    fn test_holdings_sum_latest_values() {
        let tokens = vec![
            token("ETH", 1.0, &[(100.0, "2024-01-01T00:00:00.000Z"), (300.0, "2024-03-01T00:00:00.000Z")]),
            token("ETH", 2.0, &[]),
            token("BTC", 0.5, &[(100.0, "2024-02-01T00:00:00.000Z")]),
        ];
        let (holdings, total) = holdings(&tokens);
        assert_eq!(total, 400.0);
        assert_eq!(holdings[0].ticker, "BTC");
        assert_eq!(holdings[0].distribution, 25.0);
        assert_eq!(holdings[1].amount, 3.0);
        assert_eq!(holdings[1].value, 300.0);
        assert_eq!(holdings[1].distribution, 75.0);
    }

    #[test]
    fn test_zero_total_has_zero_distribution() {
        let (holdings, total) = holdings(&[token("DOGE", 10.0, &[])]);
        assert_eq!(total, 0.0);
        assert_eq!(holdings[0].distribution, 0.0);
    }
}
