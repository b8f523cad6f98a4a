//! Asset classification vocabulary.
//!
//! The class and sub-class sets are frozen; sub-class targets are only valid
//! under the parent class listed in [`AssetClass::valid_sub_classes`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level asset class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    AlternativeInvestment,
    Commodity,
    Debt,
    Equity,
    FixedIncome,
    Liquidity,
    PreciousMetals,
    RealEstate,
}

/// Second-level asset classification within a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetSubClass {
    Bond,
    Cash,
    Collectible,
    Commodity,
    Cryptocurrency,
    DebtFund,
    Etf,
    FixedDeposit,
    #[serde(rename = "GOLD_22K")]
    Gold22k,
    #[serde(rename = "GOLD_24K")]
    Gold24k,
    GoldEtf,
    House,
    Mutualfund,
    Plot,
    PreciousMetal,
    PrivateEquity,
    SilverBar,
    Stock,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::AlternativeInvestment => "ALTERNATIVE_INVESTMENT",
            AssetClass::Commodity => "COMMODITY",
            AssetClass::Debt => "DEBT",
            AssetClass::Equity => "EQUITY",
            AssetClass::FixedIncome => "FIXED_INCOME",
            AssetClass::Liquidity => "LIQUIDITY",
            AssetClass::PreciousMetals => "PRECIOUS_METALS",
            AssetClass::RealEstate => "REAL_ESTATE",
        }
    }

    /// Sub-classes that may be targeted under this class.
    pub fn valid_sub_classes(&self) -> &'static [AssetSubClass] {
        use AssetSubClass::*;
        match self {
            AssetClass::Equity => &[Etf, Mutualfund, PrivateEquity, Stock],
            AssetClass::Debt => &[Bond, DebtFund, FixedDeposit],
            AssetClass::PreciousMetals => &[Gold22k, Gold24k, GoldEtf, SilverBar],
            AssetClass::RealEstate => &[House, Plot],
            AssetClass::Commodity => &[Commodity, PreciousMetal],
            AssetClass::Liquidity => &[Cash, Cryptocurrency],
            AssetClass::FixedIncome => &[Bond],
            AssetClass::AlternativeInvestment => &[Collectible],
        }
    }

    pub fn is_valid_sub_class(&self, sub_class: &AssetSubClass) -> bool {
        self.valid_sub_classes().contains(sub_class)
    }
}

impl AssetSubClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSubClass::Bond => "BOND",
            AssetSubClass::Cash => "CASH",
            AssetSubClass::Collectible => "COLLECTIBLE",
            AssetSubClass::Commodity => "COMMODITY",
            AssetSubClass::Cryptocurrency => "CRYPTOCURRENCY",
            AssetSubClass::DebtFund => "DEBT_FUND",
            AssetSubClass::Etf => "ETF",
            AssetSubClass::FixedDeposit => "FIXED_DEPOSIT",
            AssetSubClass::Gold22k => "GOLD_22K",
            AssetSubClass::Gold24k => "GOLD_24K",
            AssetSubClass::GoldEtf => "GOLD_ETF",
            AssetSubClass::House => "HOUSE",
            AssetSubClass::Mutualfund => "MUTUALFUND",
            AssetSubClass::Plot => "PLOT",
            AssetSubClass::PreciousMetal => "PRECIOUS_METAL",
            AssetSubClass::PrivateEquity => "PRIVATE_EQUITY",
            AssetSubClass::SilverBar => "SILVER_BAR",
            AssetSubClass::Stock => "STOCK",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for AssetSubClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALTERNATIVE_INVESTMENT" => Ok(AssetClass::AlternativeInvestment),
            "COMMODITY" => Ok(AssetClass::Commodity),
            "DEBT" => Ok(AssetClass::Debt),
            "EQUITY" => Ok(AssetClass::Equity),
            "FIXED_INCOME" => Ok(AssetClass::FixedIncome),
            "LIQUIDITY" => Ok(AssetClass::Liquidity),
            "PRECIOUS_METALS" => Ok(AssetClass::PreciousMetals),
            "REAL_ESTATE" => Ok(AssetClass::RealEstate),
            _ => Err(format!("Unknown asset class: {}", s)),
        }
    }
}

impl FromStr for AssetSubClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOND" => Ok(AssetSubClass::Bond),
            "CASH" => Ok(AssetSubClass::Cash),
            "COLLECTIBLE" => Ok(AssetSubClass::Collectible),
            "COMMODITY" => Ok(AssetSubClass::Commodity),
            "CRYPTOCURRENCY" => Ok(AssetSubClass::Cryptocurrency),
            "DEBT_FUND" => Ok(AssetSubClass::DebtFund),
            "ETF" => Ok(AssetSubClass::Etf),
            "FIXED_DEPOSIT" => Ok(AssetSubClass::FixedDeposit),
            "GOLD_22K" => Ok(AssetSubClass::Gold22k),
            "GOLD_24K" => Ok(AssetSubClass::Gold24k),
            "GOLD_ETF" => Ok(AssetSubClass::GoldEtf),
            "HOUSE" => Ok(AssetSubClass::House),
            "MUTUALFUND" => Ok(AssetSubClass::Mutualfund),
            "PLOT" => Ok(AssetSubClass::Plot),
            "PRECIOUS_METAL" => Ok(AssetSubClass::PreciousMetal),
            "PRIVATE_EQUITY" => Ok(AssetSubClass::PrivateEquity),
            "SILVER_BAR" => Ok(AssetSubClass::SilverBar),
            "STOCK" => Ok(AssetSubClass::Stock),
            _ => Err(format!("Unknown asset sub-class: {}", s)),
        }
    }
}
