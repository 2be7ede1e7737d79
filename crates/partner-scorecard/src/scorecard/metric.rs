use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fixed catalog of evaluation dimensions, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    AnnualRevenues,
    RevenueGrowth,
    NetNewLogoRevenues,
    SaasRevenueShare,
    AverageDealSize,
    AverageTimeToClose,
    RenewalRate,
    NetRevenueExpansion,
    RegisteredDeals,
    RegisteredDealWinLoss,
    PartnerGeneratedPipeline,
    FrequencyOfBusiness,
    MdfUtilization,
    SalesOrganizationQuality,
    CustomerSatisfaction,
    VendorCertifications,
    SalesSupportCalls,
    TechSupportCalls,
    VendorCommunication,
    TotalRevenues,
    DedicationVsCompetitiveProducts,
    DedicationVsOtherVendors,
    GeographicalCoverage,
    VerticalCoverage,
    ManagementQuality,
    KnownLitigation,
    ExportControlAndIpProtection,
    FinancialStrength,
}

/// Number of metrics in the catalog.
pub const METRIC_COUNT: usize = 28;

/// Highest score a single metric can earn.
pub const MAX_METRIC_SCORE: u8 = 5;

/// Highest total a partner can reach across the catalog.
pub const MAX_TOTAL_SCORE: u32 = MAX_METRIC_SCORE as u32 * METRIC_COUNT as u32;

impl Metric {
    pub const fn ordered() -> [Self; METRIC_COUNT] {
        [
            Self::AnnualRevenues,
            Self::RevenueGrowth,
            Self::NetNewLogoRevenues,
            Self::SaasRevenueShare,
            Self::AverageDealSize,
            Self::AverageTimeToClose,
            Self::RenewalRate,
            Self::NetRevenueExpansion,
            Self::RegisteredDeals,
            Self::RegisteredDealWinLoss,
            Self::PartnerGeneratedPipeline,
            Self::FrequencyOfBusiness,
            Self::MdfUtilization,
            Self::SalesOrganizationQuality,
            Self::CustomerSatisfaction,
            Self::VendorCertifications,
            Self::SalesSupportCalls,
            Self::TechSupportCalls,
            Self::VendorCommunication,
            Self::TotalRevenues,
            Self::DedicationVsCompetitiveProducts,
            Self::DedicationVsOtherVendors,
            Self::GeographicalCoverage,
            Self::VerticalCoverage,
            Self::ManagementQuality,
            Self::KnownLitigation,
            Self::ExportControlAndIpProtection,
            Self::FinancialStrength,
        ]
    }

    /// Column and snapshot key used for this metric.
    pub const fn label(self) -> &'static str {
        match self {
            Self::AnnualRevenues => "Annual revenues for vendor",
            Self::RevenueGrowth => "Year-on-year revenue growth",
            Self::NetNewLogoRevenues => "Net-new logo revenues",
            Self::SaasRevenueShare => "Percentage of vendor revenues from SaaS",
            Self::AverageDealSize => "Average deal size",
            Self::AverageTimeToClose => "Average time to close",
            Self::RenewalRate => "Renewal rate",
            Self::NetRevenueExpansion => "Net revenue expansion",
            Self::RegisteredDeals => "Registered deals",
            Self::RegisteredDealWinLoss => "Win/loss ratio for registered deals",
            Self::PartnerGeneratedPipeline => "Partner Generated Opportunities as a % of Pipeline",
            Self::FrequencyOfBusiness => "Frequency of business",
            Self::MdfUtilization => "MDF utilization rate",
            Self::SalesOrganizationQuality => "Quality of sales organization",
            Self::CustomerSatisfaction => "Customer satisfaction",
            Self::VendorCertifications => "Vendor certification(s)",
            Self::SalesSupportCalls => "Sales support calls received",
            Self::TechSupportCalls => "Tech support calls received",
            Self::VendorCommunication => "Communication with vendor",
            Self::TotalRevenues => "Total revenues (if available)",
            Self::DedicationVsCompetitiveProducts => "Dedication vs. competitive products",
            Self::DedicationVsOtherVendors => "Dedication vs. other vendors",
            Self::GeographicalCoverage => "Geographical market coverage",
            Self::VerticalCoverage => "Vertical market coverage",
            Self::ManagementQuality => "Quality of management",
            Self::KnownLitigation => "Known litigation (No=5, Yes = 1)",
            Self::ExportControlAndIpProtection => {
                "Export control and protection of intellectual property"
            }
            Self::FinancialStrength => "Financial strength",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ordered()
            .into_iter()
            .find(|metric| metric.label() == label)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric '{0}'")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_label(value).ok_or_else(|| UnknownMetric(value.to_string()))
    }
}

// Metrics travel by label so snapshots and HTTP payloads stay human-editable.
impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One of the five score levels a band can award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScoreLevel(u8);

impl ScoreLevel {
    pub const fn new(value: u8) -> Option<Self> {
        if value >= 1 && value <= MAX_METRIC_SCORE {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn ascending() -> [Self; 5] {
        [Self(1), Self(2), Self(3), Self(4), Self(5)]
    }

    /// Highest level first; the resolver's tie-break order.
    pub const fn descending() -> [Self; 5] {
        [Self(5), Self(4), Self(3), Self(2), Self(1)]
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Snapshot key, e.g. `Score 3`.
    pub fn key(self) -> String {
        format!("Score {}", self.0)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        key.trim()
            .strip_prefix("Score ")
            .and_then(|digits| digits.trim().parse::<u8>().ok())
            .and_then(Self::new)
    }
}

impl fmt::Display for ScoreLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ScoreLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for ScoreLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Self::new(raw).ok_or_else(|| {
            serde::de::Error::custom(format!("score level must be between 1 and 5, got {raw}"))
        })
    }
}
