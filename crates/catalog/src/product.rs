use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, ProductId, ValueObject};

/// Product class: behavior flags shared by a family of products.
///
/// Whether availability is constrained by stock levels is a property of the
/// class, not of individual products: a bookshop tracks stock for paperbacks
/// but not for ebooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductClass {
    pub name: String,
    pub requires_shipping: bool,
    pub track_stock: bool,
}

impl ProductClass {
    pub fn new(
        name: impl Into<String>,
        requires_shipping: bool,
        track_stock: bool,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product class name cannot be empty"));
        }
        Ok(Self {
            name,
            requires_shipping,
            track_stock,
        })
    }

    /// Conventional class for physical, stock-tracked goods.
    pub fn physical(name: impl Into<String>) -> DomainResult<Self> {
        Self::new(name, true, true)
    }

    /// Conventional class for digital goods: nothing to ship, no stock to run out of.
    pub fn digital(name: impl Into<String>) -> DomainResult<Self> {
        Self::new(name, false, false)
    }
}

impl ValueObject for ProductClass {}

/// Catalog entity: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    upc: String,
    title: String,
    product_class: ProductClass,
}

impl Product {
    pub fn new(
        id: ProductId,
        upc: impl Into<String>,
        title: impl Into<String>,
        product_class: ProductClass,
    ) -> DomainResult<Self> {
        let upc = upc.into();
        let title = title.into();
        if upc.trim().is_empty() {
            return Err(DomainError::validation("upc cannot be empty"));
        }
        if title.trim().is_empty() {
            return Err(DomainError::validation("title cannot be empty"));
        }
        Ok(Self {
            id,
            upc,
            title,
            product_class,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn upc(&self) -> &str {
        &self.upc
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn product_class(&self) -> &ProductClass {
        &self.product_class
    }

    /// Whether purchases of this product are constrained by stock levels.
    pub fn is_stock_tracked(&self) -> bool {
        self.product_class.track_stock
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
