//! Filter spec and query-URL construction.

use crate::error::ScrapeError;
use crate::immoweb::models::TransactionKind;
use serde::{Deserialize, Serialize};

/// Property categories as Immoweb spells them in the URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyCategory {
    Apartment,
    House,
    HouseAndApartment,
    Garage,
    Office,
    Business,
    Industry,
    Land,
    Other,
}

impl PropertyCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            PropertyCategory::Apartment => "apartment",
            PropertyCategory::House => "house",
            PropertyCategory::HouseAndApartment => "house-and-apartment",
            PropertyCategory::Garage => "garage",
            PropertyCategory::Office => "office",
            PropertyCategory::Business => "business",
            PropertyCategory::Industry => "industry",
            PropertyCategory::Land => "land",
            PropertyCategory::Other => "other",
        }
    }
}

impl std::str::FromStr for PropertyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "apartment" => Ok(PropertyCategory::Apartment),
            "house" => Ok(PropertyCategory::House),
            "house-and-apartment" => Ok(PropertyCategory::HouseAndApartment),
            "garage" => Ok(PropertyCategory::Garage),
            "office" => Ok(PropertyCategory::Office),
            "business" => Ok(PropertyCategory::Business),
            "industry" => Ok(PropertyCategory::Industry),
            "land" => Ok(PropertyCategory::Land),
            "other" => Ok(PropertyCategory::Other),
            _ => Err(format!("Unknown property category: {}", s)),
        }
    }
}

/// Result ordering options accepted by the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Relevance,
    Cheapest,
    MostExpensive,
    Newest,
    PostalCode,
}

impl SortOrder {
    pub fn slug(&self) -> &'static str {
        match self {
            SortOrder::Relevance => "relevance",
            SortOrder::Cheapest => "cheapest",
            SortOrder::MostExpensive => "most-expensive",
            SortOrder::Newest => "newest",
            SortOrder::PostalCode => "postal-code",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortOrder::Relevance),
            "cheapest" => Ok(SortOrder::Cheapest),
            "most-expensive" => Ok(SortOrder::MostExpensive),
            "newest" => Ok(SortOrder::Newest),
            "postal-code" => Ok(SortOrder::PostalCode),
            _ => Err(format!(
                "Unknown sort order: {}. Use: relevance, cheapest, most-expensive, newest, postal-code",
                s
            )),
        }
    }
}

/// Structured search criteria for one pipeline run.
///
/// Category and transaction kind fall back to the configured defaults when
/// unset; at least one city or postal code is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub categories: Vec<PropertyCategory>,
    #[serde(default)]
    pub transaction: Option<TransactionKind>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub immediately_available: Option<bool>,
    #[serde(default)]
    pub min_bedrooms: Option<u32>,
    #[serde(default)]
    pub max_bedrooms: Option<u32>,
    #[serde(default)]
    pub min_price: Option<u32>,
    #[serde(default)]
    pub max_price: Option<u32>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub postal_codes: Vec<u32>,
    #[serde(default)]
    pub order: SortOrder,
}

/// Builds canonical search URLs from filter specs.
///
/// Pure: no I/O, byte-identical output for identical input.
pub struct QueryBuilder {
    base_url: String,
    default_categories: Vec<PropertyCategory>,
    default_transaction: TransactionKind,
}

impl QueryBuilder {
    pub fn new(
        base_url: impl Into<String>,
        default_categories: Vec<PropertyCategory>,
        default_transaction: TransactionKind,
    ) -> Self {
        Self { base_url: base_url.into(), default_categories, default_transaction }
    }

    /// Builds the search URL for the given filters.
    ///
    /// Fails with `InvalidFilters` before any network I/O when the category
    /// cannot be resolved, neither cities nor postal codes are supplied, or a
    /// min/max bound pair is inverted.
    pub fn build(&self, filters: &FilterSpec) -> Result<String, ScrapeError> {
        let categories: &[PropertyCategory] = if filters.categories.is_empty() {
            &self.default_categories
        } else {
            &filters.categories
        };
        if categories.is_empty() {
            return Err(ScrapeError::InvalidFilters(
                "at least one property category is required".into(),
            ));
        }

        let transaction = filters.transaction.unwrap_or(self.default_transaction);

        if filters.cities.is_empty() && filters.postal_codes.is_empty() {
            return Err(ScrapeError::InvalidFilters(
                "at least one city or postal code is required".into(),
            ));
        }

        if let (Some(min), Some(max)) = (filters.min_bedrooms, filters.max_bedrooms) {
            if min > max {
                return Err(ScrapeError::InvalidFilters(format!(
                    "min bedrooms {} exceeds max bedrooms {}",
                    min, max
                )));
            }
        }
        if let (Some(min), Some(max)) = (filters.min_price, filters.max_price) {
            if min > max {
                return Err(ScrapeError::InvalidFilters(format!(
                    "min price {} exceeds max price {}",
                    min, max
                )));
            }
        }

        let category_path =
            categories.iter().map(|c| c.slug()).collect::<Vec<_>>().join(",");

        let mut url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            category_path,
            transaction.slug()
        );

        // Parameter order is fixed; absent fields are omitted entirely.
        let mut params: Vec<String> = Vec::new();

        if let Some(country) = &filters.country {
            params.push(format!("countries={}", urlencoding::encode(country)));
        }
        if let Some(available) = filters.immediately_available {
            params.push(format!("isImmediatelyAvailable={}", available));
        }
        if let Some(min) = filters.min_bedrooms {
            params.push(format!("minBedroomCount={}", min));
        }
        if let Some(max) = filters.max_bedrooms {
            params.push(format!("maxBedroomCount={}", max));
        }
        if let Some(min) = filters.min_price {
            params.push(format!("minPrice={}", min));
        }
        if let Some(max) = filters.max_price {
            params.push(format!("maxPrice={}", max));
        }
        params.push(format!("priceType={}", transaction.price_type()));
        if !filters.cities.is_empty() {
            let cities = filters
                .cities
                .iter()
                .map(|c| urlencoding::encode(c).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            params.push(format!("cities={}", cities));
        }
        if !filters.postal_codes.is_empty() {
            let codes = filters
                .postal_codes
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",");
            params.push(format!("postalCodes={}", codes));
        }
        params.push(format!("orderBy={}", filters.order.slug()));

        url.push('?');
        url.push_str(&params.join("&"));

        Ok(url)
    }
}
