use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::sorting::SortOption;

const FEATURE_PREFIX: &str = "feature_";

/// Catalog query parameters, typed. Unparseable values are dropped rather
/// than failing the request.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CatalogParams {
    pub sort: SortOption,
    pub page: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub manufacturers: Vec<i32>,
    pub is_limited: Option<bool>,
    pub in_stock: bool,
    pub features: BTreeMap<i32, Vec<String>>,
}

impl CatalogParams {
    /// Builds parameters from raw query pairs. Repeated keys and comma
    /// separated values both add to list parameters.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut params = CatalogParams::default();

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "sort" => params.sort = SortOption::from_param(value).unwrap_or_default(),
                "page" => params.page = Some(value.to_owned()),
                "price_min" => params.price_min = value.parse().ok(),
                "price_max" => params.price_max = value.parse().ok(),
                "manufacturer" => params
                    .manufacturers
                    .extend(split_list(value).filter_map(|id| id.parse::<i32>().ok())),
                "is_limited" => params.is_limited = parse_bool(value),
                "in_stock" => params.in_stock = parse_bool(value).unwrap_or(false),
                other => {
                    let Some(feature_id) = other
                        .strip_prefix(FEATURE_PREFIX)
                        .and_then(|id| id.parse::<i32>().ok())
                    else {
                        continue;
                    };
                    params
                        .features
                        .entry(feature_id)
                        .or_default()
                        .extend(split_list(value).map(str::to_owned));
                }
            }
        }

        params.manufacturers.sort_unstable();
        params.manufacturers.dedup();
        for values in params.features.values_mut() {
            values.sort();
            values.dedup();
        }
        params
    }

    /// Echo of the parsed parameters used to pre-fill the filter form.
    pub fn initial_dict(&self) -> Map<String, Value> {
        let mut initial = Map::new();
        initial.insert("sort".into(), json!(self.sort.as_param()));
        if let Some(min) = self.price_min {
            initial.insert("price_min".into(), json!(min));
        }
        if let Some(max) = self.price_max {
            initial.insert("price_max".into(), json!(max));
        }
        if !self.manufacturers.is_empty() {
            initial.insert("manufacturer".into(), json!(self.manufacturers));
        }
        if let Some(limited) = self.is_limited {
            initial.insert("is_limited".into(), json!(limited));
        }
        if self.in_stock {
            initial.insert("in_stock".into(), json!(true));
        }
        for (feature_id, values) in &self.features {
            initial.insert(format!("{FEATURE_PREFIX}{feature_id}"), json!(values));
        }
        initial
    }
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|part| !part.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
