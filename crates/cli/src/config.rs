//! Catalog seeding.
//!
//! The catalog is configuration, not domain state: it is described by plain
//! DTOs (deserialized with serde) and validated by building the real domain
//! objects from them.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use storefront_core::DomainError;
use storefront_products::{Product, ProductKind};
use storefront_promotions::{Promotion, PromotionRule};
use storefront_store::{Store, shared};

/// Environment variable naming a JSON catalog file.
pub const CATALOG_ENV: &str = "STOREFRONT_CATALOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("product {product:?} references unknown promotion {promotion:?}")]
    UnknownPromotion { product: String, promotion: String },

    #[error("capped product {0:?} needs max_per_order")]
    MissingMaxPerOrder(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromotionConfig {
    pub name: String,
    #[serde(flatten)]
    pub rule: PromotionRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKindConfig {
    #[default]
    Standard,
    Unlimited,
    Capped,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub kind: ProductKindConfig,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub max_per_order: Option<i64>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Names of entries in [`CatalogConfig::promotions`].
    #[serde(default)]
    pub promotions: Vec<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub promotions: Vec<PromotionConfig>,
    pub products: Vec<ProductConfig>,
}

impl CatalogConfig {
    /// Read the catalog named by `STOREFRONT_CATALOG`, or the demo catalog.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CATALOG_ENV) {
            Some(path) => {
                tracing::info!("loading catalog from {}", Path::new(&path).display());
                Self::from_path(Path::new(&path))
            }
            None => {
                tracing::info!("{CATALOG_ENV} not set; using demo catalog");
                Ok(Self::demo())
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The demo catalog: three stocked gadgets, a license and capped shipping.
    pub fn demo() -> Self {
        let promotion = |name: &str, rule| PromotionConfig {
            name: name.to_string(),
            rule,
        };
        let product = |name: &str, price, kind, quantity, promotions: &[&str]| ProductConfig {
            name: name.to_string(),
            price,
            kind,
            quantity,
            max_per_order: None,
            active: true,
            promotions: promotions.iter().map(|p| p.to_string()).collect(),
        };

        let mut shipping = product("Shipping", 10.0, ProductKindConfig::Capped, 250, &[]);
        shipping.max_per_order = Some(1);

        Self {
            promotions: vec![
                promotion("Second Half price!", PromotionRule::SecondHalfPrice),
                promotion("Third One Free!", PromotionRule::ThirdOneFree),
                promotion("30% off!", PromotionRule::PercentDiscount { percent: 30.0 }),
            ],
            products: vec![
                product(
                    "MacBook Air M2",
                    1450.0,
                    ProductKindConfig::Standard,
                    100,
                    &["Second Half price!"],
                ),
                product(
                    "Bose QuietComfort Earbuds",
                    250.0,
                    ProductKindConfig::Standard,
                    500,
                    &["Third One Free!"],
                ),
                product("Google Pixel 7", 500.0, ProductKindConfig::Standard, 250, &[]),
                product(
                    "Windows License",
                    125.0,
                    ProductKindConfig::Unlimited,
                    0,
                    &["30% off!"],
                ),
                shipping,
            ],
        }
    }

    /// Validate every entry and assemble the store.
    pub fn build_store(&self) -> Result<Store, ConfigError> {
        let promotions = self
            .promotions
            .iter()
            .map(|p| Promotion::new(p.name.clone(), p.rule.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        let products = self
            .products
            .iter()
            .map(|p| p.build(&promotions).map(shared))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Store::new(products)?)
    }
}

impl ProductConfig {
    fn build(&self, promotions: &[Promotion]) -> Result<Product, ConfigError> {
        let kind = match self.kind {
            ProductKindConfig::Standard => ProductKind::Standard,
            ProductKindConfig::Unlimited => ProductKind::Unlimited,
            ProductKindConfig::Capped => ProductKind::Capped {
                max_per_order: self
                    .max_per_order
                    .ok_or_else(|| ConfigError::MissingMaxPerOrder(self.name.clone()))?,
            },
        };

        let mut product = Product::new(self.name.clone(), self.price, self.quantity, kind)?;
        for name in &self.promotions {
            let promotion = promotions
                .iter()
                .find(|p| p.name() == name)
                .ok_or_else(|| ConfigError::UnknownPromotion {
                    product: self.name.clone(),
                    promotion: name.clone(),
                })?;
            product = product.with_promotion(promotion.clone());
        }
        if !self.active {
            product = product.inactive();
        }
        Ok(product)
    }
}
