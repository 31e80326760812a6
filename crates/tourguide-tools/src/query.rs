//! Typed backend queries built from model-supplied tool arguments

use crate::coerce::{safe_int, safe_str};
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Optional `search_tours` arguments forwarded verbatim
pub const SEARCH_FILTER_KEYS: &[&str] = &[
    "stars",
    "starsbetter",
    "meal",
    "mealbetter",
    "rating",
    "hotels",
    "hoteltypes",
    "regions",
    "subregions",
    "operators",
    "pricefrom",
    "priceto",
    "pricetype",
    "services",
    "onrequest",
    "directflight",
    "flightclass",
    "currency",
    "hideregular",
];

/// Optional `get_hot_tours` arguments forwarded verbatim
pub const HOT_TOUR_FILTER_KEYS: &[&str] = &[
    "city2", "city3", "uniq2", "uniq3", "countries", "regions", "operators", "datefrom", "dateto",
    "stars", "meal", "rating", "maxdays",
];

/// Hotel type flags accepted by the hotel dictionary (`hotactive`, `hotrelax`, ...)
pub const HOTEL_TYPES: &[&str] = &["active", "relax", "family", "health", "city", "beach", "deluxe"];

/// Render an argument as a query parameter; lists are comma-joined.
#[must_use]
pub fn wire_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Array(items) => {
            let joined: Vec<String> = items.iter().filter_map(wire_param).collect();
            (!joined.is_empty()).then(|| joined.join(","))
        }
        Value::Object(_) => None,
    }
}

fn opt_int(args: &Map<String, Value>, key: &str) -> Option<i64> {
    args.get(key).filter(|v| !v.is_null()).map(|v| safe_int(Some(v), 0))
}

fn is_one(args: &Map<String, Value>, key: &str) -> bool {
    opt_int(args, key) == Some(1)
}

fn required_str(args: &Map<String, Value>, key: &str) -> Result<String> {
    safe_str(args.get(key)).ok_or_else(|| Error::InvalidInput(format!("{key} is required")))
}

fn collect_filters(args: &Map<String, Value>, keys: &[&str]) -> BTreeMap<String, String> {
    keys.iter()
        .filter_map(|key| {
            args.get(*key)
                .and_then(wire_param)
                .map(|value| ((*key).to_string(), value))
        })
        .collect()
}

/// Asynchronous tour search submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
    pub departure: Option<i64>,
    pub country: Option<i64>,
    pub datefrom: Option<String>,
    pub dateto: Option<String>,
    pub nightsfrom: i64,
    pub nightsto: i64,
    pub adults: i64,
    pub child: i64,
    /// Ages of up to three children
    pub child_ages: Vec<i64>,
    /// Remaining optional filters, already rendered
    pub filters: BTreeMap<String, String>,
}

impl SearchQuery {
    /// Build from (already normalized) `search_tours` arguments
    #[must_use]
    pub fn from_args(args: &Map<String, Value>) -> Self {
        Self {
            departure: opt_int(args, "departure"),
            country: opt_int(args, "country"),
            datefrom: safe_str(args.get("datefrom")),
            dateto: safe_str(args.get("dateto")),
            nightsfrom: opt_int(args, "nightsfrom").unwrap_or(7),
            nightsto: opt_int(args, "nightsto").unwrap_or(10),
            adults: opt_int(args, "adults").unwrap_or(2),
            child: opt_int(args, "child").unwrap_or(0),
            child_ages: (1..=3)
                .filter_map(|i| opt_int(args, &format!("childage{i}")))
                .filter(|age| *age != 0)
                .collect(),
            filters: collect_filters(args, SEARCH_FILTER_KEYS),
        }
    }

    /// Query parameters for `search.php`
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));
        if let Some(departure) = self.departure {
            push("departure", departure.to_string());
        }
        if let Some(country) = self.country {
            push("country", country.to_string());
        }
        if let Some(datefrom) = &self.datefrom {
            push("datefrom", datefrom.clone());
        }
        if let Some(dateto) = &self.dateto {
            push("dateto", dateto.clone());
        }
        push("nightsfrom", self.nightsfrom.to_string());
        push("nightsto", self.nightsto.to_string());
        push("adults", self.adults.to_string());
        push("child", self.child.to_string());
        for (i, age) in self.child_ages.iter().enumerate() {
            push(&format!("childage{}", i + 1), age.to_string());
        }
        for (key, value) in &self.filters {
            push(key, value.clone());
        }
        params
    }
}

/// One page of a search's results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsQuery {
    pub request_id: String,
    pub page: i64,
    pub per_page: i64,
    pub operator_status: bool,
    pub no_description: bool,
}

impl ResultsQuery {
    /// Build from `get_search_results` arguments
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            request_id: required_str(args, "requestid")?,
            page: opt_int(args, "page").unwrap_or(1),
            per_page: opt_int(args, "onpage").unwrap_or(10),
            operator_status: is_one(args, "operatorstatus"),
            no_description: is_one(args, "nodescription"),
        })
    }
}

/// Hot deals feed query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotToursQuery {
    pub city: i64,
    pub items: i64,
    pub tour_type: i64,
    pub visa_free: bool,
    pub sort_by_price: bool,
    pub picture_type: i64,
    pub currency: i64,
    pub filters: BTreeMap<String, String>,
}

impl HotToursQuery {
    /// Build from `get_hot_tours` arguments; `city` is required
    pub fn from_args(args: &Map<String, Value>) -> Result<Self> {
        let city = opt_int(args, "city").ok_or_else(|| Error::InvalidInput("city is required".into()))?;
        Ok(Self {
            city,
            items: opt_int(args, "items").unwrap_or(10),
            tour_type: opt_int(args, "tourtype").unwrap_or(0),
            visa_free: is_one(args, "visa"),
            sort_by_price: is_one(args, "sort"),
            picture_type: opt_int(args, "picturetype").unwrap_or(0),
            currency: opt_int(args, "currency").unwrap_or(0),
            filters: collect_filters(args, HOT_TOUR_FILTER_KEYS),
        })
    }

    /// Query parameters for `hottours.php`
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("city".to_string(), self.city.to_string()),
            ("items".to_string(), self.items.to_string()),
            ("tourtype".to_string(), self.tour_type.to_string()),
            ("picturetype".to_string(), self.picture_type.to_string()),
            ("currency".to_string(), self.currency.to_string()),
        ];
        if self.visa_free {
            params.push(("visa".to_string(), "1".to_string()));
        }
        if self.sort_by_price {
            params.push(("sort".to_string(), "1".to_string()));
        }
        params.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

/// Hotel catalog filter
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HotelFilter {
    pub country: Option<String>,
    pub region: Option<String>,
    pub stars: Option<String>,
    pub rating: Option<String>,
    /// Hotel type flags set to 1
    pub types: Vec<&'static str>,
    /// Lowercase substring of the hotel name
    pub name: Option<String>,
}

impl HotelFilter {
    /// Query parameters for `list.php?type=hotel`
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for (key, value) in [
            ("hotcountry", &self.country),
            ("hotregion", &self.region),
            ("hotstars", &self.stars),
            ("hotrating", &self.rating),
        ] {
            if let Some(value) = value {
                params.push((key.to_string(), value.clone()));
            }
        }
        for kind in &self.types {
            params.push((format!("hot{kind}"), "1".to_string()));
        }
        params
    }

    /// Whether a catalog entry passes the name filter
    #[must_use]
    pub fn matches_name(&self, hotel: &Value) -> bool {
        match &self.name {
            None => true,
            Some(needle) => hotel
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(needle)),
        }
    }
}

/// Reference data lookups behind `get_dictionaries`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dictionary {
    Departures,
    Countries { departure: Option<String> },
    Subregions { country: Option<String> },
    Regions { country: Option<String> },
    Meals,
    Stars,
    Operators { departure: Option<String>, country: Option<String> },
    Services,
    FlyDates { departure: Option<String>, country: Option<String> },
    Hotels(HotelFilter),
    Currencies,
}

impl Dictionary {
    /// Resolve the `type` argument by substring, first match wins.
    ///
    /// `subregion` is tested before `region` so it is not shadowed.
    /// Returns `None` for unknown types.
    #[must_use]
    pub fn from_args(args: &Map<String, Value>) -> Option<Self> {
        let kind = args.get("type").and_then(Value::as_str).unwrap_or_default();
        let arg = |key: &str| args.get(key).and_then(wire_param);
        let dictionary = if kind.contains("departure") {
            Self::Departures
        } else if kind.contains("country") {
            Self::Countries { departure: arg("cndep") }
        } else if kind.contains("subregion") {
            Self::Subregions { country: arg("regcountry") }
        } else if kind.contains("region") {
            Self::Regions { country: arg("regcountry") }
        } else if kind.contains("meal") {
            Self::Meals
        } else if kind.contains("stars") {
            Self::Stars
        } else if kind.contains("operator") {
            Self::Operators {
                departure: arg("flydeparture"),
                country: arg("flycountry"),
            }
        } else if kind.contains("services") {
            Self::Services
        } else if kind.contains("flydate") {
            Self::FlyDates {
                departure: arg("flydeparture"),
                country: arg("flycountry"),
            }
        } else if kind.contains("hotel") {
            Self::Hotels(HotelFilter {
                country: arg("hotcountry"),
                region: arg("hotregion"),
                stars: arg("hotstars"),
                rating: arg("hotrating"),
                types: HOTEL_TYPES
                    .iter()
                    .copied()
                    .filter(|kind| is_one(args, &format!("hot{kind}")))
                    .collect(),
                name: arg("name").map(|n| n.to_lowercase()),
            })
        } else if kind.contains("currency") {
            Self::Currencies
        } else {
            return None;
        };
        Some(dictionary)
    }

    /// `list.php` type name
    #[must_use]
    pub fn list_type(&self) -> &'static str {
        match self {
            Self::Departures => "departure",
            Self::Countries { .. } => "country",
            Self::Subregions { .. } => "subregion",
            Self::Regions { .. } => "region",
            Self::Meals => "meal",
            Self::Stars => "stars",
            Self::Operators { .. } => "operator",
            Self::Services => "services",
            Self::FlyDates { .. } => "flydate",
            Self::Hotels(_) => "hotel",
            Self::Currencies => "currency",
        }
    }

    /// Extra `list.php` parameters
    #[must_use]
    pub fn to_params(&self) -> Vec<(String, String)> {
        let pairs: Vec<(&str, &Option<String>)> = match self {
            Self::Countries { departure } => vec![("cndep", departure)],
            Self::Subregions { country } | Self::Regions { country } => vec![("regcountry", country)],
            Self::Operators { departure, country } | Self::FlyDates { departure, country } => {
                vec![("flydeparture", departure), ("flycountry", country)]
            }
            Self::Hotels(filter) => return filter.to_params(),
            _ => Vec::new(),
        };
        pairs
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
            .collect()
    }
}
