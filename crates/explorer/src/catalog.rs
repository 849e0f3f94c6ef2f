//! Two-level product / sub-layer index over the layer names a service offers.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use wms_common::LayerId;

/// Product bucket for layer names without a usable `_` split.
pub const MISCELLANEOUS: &str = "Miscellaneous";

/// Layer names grouped by the text before their first `_`.
///
/// `MODIS_Terra_CorrectedReflectance_TrueColor` becomes product `MODIS` with
/// sub-layer `Terra_CorrectedReflectance_TrueColor`. Names without an `_`, or
/// with nothing before or after the first one, go to [`MISCELLANEOUS`] under
/// their full name. Only non-empty products exist;
/// products and sub-layers iterate in lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    products: BTreeMap<String, BTreeMap<String, LayerId>>,
}

/// One product with its sub-layers, as offered to a product selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub product: String,
    pub sublayers: Vec<String>,
}

impl CatalogIndex {
    pub fn build<'a>(layer_ids: impl IntoIterator<Item = &'a LayerId>) -> Self {
        let mut products: BTreeMap<String, BTreeMap<String, LayerId>> = BTreeMap::new();

        for id in layer_ids {
            let (product, sublayer) = match id.split_product() {
                // A literal "Miscellaneous_" prefix keeps its full name so it
                // cannot collide with an un-prefixed layer of the same suffix.
                Some((MISCELLANEOUS, _)) => (MISCELLANEOUS, id.as_str()),
                Some((product, sublayer)) => (product, sublayer),
                None => (MISCELLANEOUS, id.as_str()),
            };
            products
                .entry(product.to_string())
                .or_default()
                .insert(sublayer.to_string(), id.clone());
        }

        debug!(products = products.len(), "Built catalog index");
        Self { products }
    }

    /// Product keys, sorted.
    pub fn products(&self) -> Vec<&str> {
        self.products.keys().map(String::as_str).collect()
    }

    /// Sub-layer keys of `product`, sorted; empty for an unknown product.
    pub fn sublayers(&self, product: &str) -> Vec<&str> {
        self.products
            .get(product)
            .map(|subs| subs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains_product(&self, product: &str) -> bool {
        self.products.contains_key(product)
    }

    /// Full layer name for a product / sub-layer pair.
    pub fn layer_id(&self, product: &str, sublayer: &str) -> Option<&LayerId> {
        self.products.get(product)?.get(sublayer)
    }

    /// Total number of indexed layers.
    pub fn len(&self) -> usize {
        self.products.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.products
            .iter()
            .map(|(product, subs)| CatalogEntry {
                product: product.clone(),
                sublayers: subs.keys().cloned().collect(),
            })
            .collect()
    }
}
