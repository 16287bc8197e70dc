use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use storefront_catalog::Product;
use storefront_core::{DomainError, DomainResult};

use crate::stockrecord::StockRecord;

/// Short machine-readable availability status, surfaced to display code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityCode {
    Available,
    Unavailable,
    InStock,
    OutOfStock,
}

impl AvailabilityCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityCode::Available => "available",
            AvailabilityCode::Unavailable => "unavailable",
            AvailabilityCode::InStock => "instock",
            AvailabilityCode::OutOfStock => "outofstock",
        }
    }
}

impl core::fmt::Display for AvailabilityCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of a purchase-permission check.
///
/// Denials carry a human-readable reason for basket and checkout messaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseDecision {
    Permitted,
    Denied { reason: String },
}

impl PurchaseDecision {
    pub fn permitted() -> Self {
        Self::Permitted
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permitted)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Permitted => None,
            Self::Denied { reason } => Some(reason),
        }
    }
}

/// Purchase-availability policy for a product.
///
/// Implementations answer the capability set that display and
/// checkout-validation code ask for: a status code and message, optional
/// fulfilment timing, and whether a proposed purchase is allowed.
///
/// The default method bodies give the deny-all base behavior; variants
/// override only what differs.
pub trait AvailabilityPolicy {
    /// Short machine-readable status.
    fn code(&self) -> AvailabilityCode {
        AvailabilityCode::Unavailable
    }

    /// Human-readable status.
    fn message(&self) -> String {
        String::new()
    }

    /// Delay before a purchased item can be dispatched, when known.
    fn lead_time(&self) -> Option<Duration> {
        None
    }

    /// Date an order placed now is expected to ship, when known.
    fn dispatch_date(&self) -> Option<NaiveDate> {
        None
    }

    /// Test whether a proposed purchase of `quantity` items is allowed.
    ///
    /// Errors only when a required collaborator is missing; see
    /// [`DelegateToStockRecord`].
    fn is_purchase_permitted(&self, quantity: u32) -> DomainResult<PurchaseDecision> {
        let _ = quantity;
        Ok(PurchaseDecision::denied("Unavailable"))
    }

    /// Test if this product is available to be bought.
    ///
    /// We test a purchase of a single item; a failing check counts as not
    /// available.
    fn is_available_to_buy(&self) -> bool {
        self.is_purchase_permitted(1)
            .map(|decision| decision.is_permitted())
            .unwrap_or(false)
    }
}

/// Policy for when a product is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl AvailabilityPolicy for Unavailable {
    fn message(&self) -> String {
        "Unavailable".to_string()
    }
}

/// For when a product is always available, irrespective of stock level.
///
/// Appropriate for digital products.
#[derive(Debug, Clone, Copy, Default)]
pub struct Available;

impl AvailabilityPolicy for Available {
    fn code(&self) -> AvailabilityCode {
        AvailabilityCode::Available
    }

    fn message(&self) -> String {
        "Available".to_string()
    }

    fn is_purchase_permitted(&self, _quantity: u32) -> DomainResult<PurchaseDecision> {
        Ok(PurchaseDecision::permitted())
    }
}

/// Ensure the stock record's net stock level is respected.
///
/// The stock record is a required collaborator, so this policy borrows it
/// outright; a record-less `StockRequired` cannot be constructed.
#[derive(Debug, Clone, Copy)]
pub struct StockRequired<'a> {
    stockrecord: &'a StockRecord,
}

impl<'a> StockRequired<'a> {
    pub fn new(stockrecord: &'a StockRecord) -> Self {
        Self { stockrecord }
    }
}

impl AvailabilityPolicy for StockRequired<'_> {
    /// Computed from the net stock level at read time.
    fn code(&self) -> AvailabilityCode {
        if self.stockrecord.net_stock_level() > 0 {
            AvailabilityCode::InStock
        } else {
            AvailabilityCode::OutOfStock
        }
    }

    fn message(&self) -> String {
        let net = self.stockrecord.net_stock_level();
        if net > 0 {
            format!("In stock ({} available)", net)
        } else {
            "Not available".to_string()
        }
    }

    fn is_purchase_permitted(&self, quantity: u32) -> DomainResult<PurchaseDecision> {
        let net = self.stockrecord.net_stock_level();
        let decision = if net == 0 {
            PurchaseDecision::denied("No stock available")
        } else if quantity > net {
            PurchaseDecision::denied(format!("A maximum of {} can be bought", net))
        } else {
            PurchaseDecision::permitted()
        };
        debug!(
            stockrecord = %self.stockrecord.id_typed(),
            quantity,
            net_stock = net,
            permitted = decision.is_permitted(),
            "stock-required purchase check"
        );
        Ok(decision)
    }
}

/// An availability policy which delegates all calls to the stock record
/// itself.
///
/// The record is optional so callers can build one policy per catalog row
/// whether or not a partner has listed the product. Without a record the
/// product reports as unavailable and purchase checks fail with
/// [`DomainError::MissingCollaborator`]; products whose class does not track
/// stock are available to buy regardless of stock levels.
#[derive(Debug, Clone, Copy)]
pub struct DelegateToStockRecord<'a> {
    product: &'a Product,
    stockrecord: Option<&'a StockRecord>,
}

impl<'a> DelegateToStockRecord<'a> {
    pub fn new(product: &'a Product, stockrecord: Option<&'a StockRecord>) -> Self {
        Self {
            product,
            stockrecord,
        }
    }
}

impl AvailabilityPolicy for DelegateToStockRecord<'_> {
    fn code(&self) -> AvailabilityCode {
        match self.stockrecord {
            Some(record) => record.availability_code(),
            None => AvailabilityCode::Unavailable,
        }
    }

    fn message(&self) -> String {
        self.stockrecord
            .map(|record| record.availability())
            .unwrap_or_default()
    }

    fn lead_time(&self) -> Option<Duration> {
        self.stockrecord.and_then(|record| record.lead_time())
    }

    fn dispatch_date(&self) -> Option<NaiveDate> {
        self.stockrecord.and_then(|record| record.dispatch_date())
    }

    fn is_purchase_permitted(&self, quantity: u32) -> DomainResult<PurchaseDecision> {
        let record = self
            .stockrecord
            .ok_or_else(|| DomainError::missing_collaborator("stock record"))?;
        Ok(record.is_purchase_permitted(quantity))
    }

    fn is_available_to_buy(&self) -> bool {
        let Some(record) = self.stockrecord else {
            return false;
        };
        if !self.product.is_stock_tracked() {
            return true;
        }
        record.is_available_to_buy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use storefront_catalog::ProductClass;
    use storefront_core::{PartnerId, ProductId, StockRecordId};

    fn test_record(num_in_stock: u32) -> StockRecord {
        StockRecord::new(
            StockRecordId::new(),
            ProductId::new(),
            PartnerId::new(),
            "PARTNER-SKU-1",
            num_in_stock,
        )
        .unwrap()
    }

    fn test_product(track_stock: bool) -> Product {
        let class = if track_stock {
            ProductClass::physical("Books").unwrap()
        } else {
            ProductClass::digital("Ebooks").unwrap()
        };
        Product::new(ProductId::new(), "9780000000001", "Paperback", class).unwrap()
    }

    #[test]
    fn available_permits_any_quantity() {
        let policy = Available;
        for quantity in [1, 7, 10_000] {
            let decision = policy.is_purchase_permitted(quantity).unwrap();
            assert!(decision.is_permitted());
            assert_eq!(decision.reason(), None);
        }
        assert!(policy.is_available_to_buy());
        assert_eq!(policy.code(), AvailabilityCode::Available);
        assert_eq!(policy.message(), "Available");
    }

    #[test]
    fn unavailable_always_denies() {
        let policy = Unavailable;
        for quantity in [1, 2, 500] {
            let decision = policy.is_purchase_permitted(quantity).unwrap();
            assert_eq!(decision.reason(), Some("Unavailable"));
        }
        assert!(!policy.is_available_to_buy());
        assert_eq!(policy.code(), AvailabilityCode::Unavailable);
        assert_eq!(policy.message(), "Unavailable");
        assert_eq!(policy.lead_time(), None);
        assert_eq!(policy.dispatch_date(), None);
    }

    #[test]
    fn stock_required_denies_when_out_of_stock() {
        let record = test_record(0);
        let policy = StockRequired::new(&record);

        let decision = policy.is_purchase_permitted(1).unwrap();
        assert_eq!(decision.reason(), Some("No stock available"));
        assert!(!policy.is_available_to_buy());
        assert_eq!(policy.code(), AvailabilityCode::OutOfStock);
        assert_eq!(policy.code().as_str(), "outofstock");
        assert_eq!(policy.message(), "Not available");
    }

    #[test]
    fn stock_required_caps_quantity_at_net_stock() {
        let record = test_record(5);
        let policy = StockRequired::new(&record);

        assert!(policy.is_purchase_permitted(5).unwrap().is_permitted());

        let decision = policy.is_purchase_permitted(6).unwrap();
        assert_eq!(decision.reason(), Some("A maximum of 5 can be bought"));
    }

    #[test]
    fn stock_required_code_reflects_stock_at_read_time() {
        let record = test_record(5);
        let policy = StockRequired::new(&record);
        assert_eq!(policy.code().as_str(), "instock");
        assert_eq!(policy.message(), "In stock (5 available)");
    }

    #[test]
    fn stock_required_respects_allocations() {
        let mut record = test_record(5);
        record.allocate(3).unwrap();

        let policy = StockRequired::new(&record);
        assert!(policy.is_purchase_permitted(2).unwrap().is_permitted());
        assert_eq!(
            policy.is_purchase_permitted(3).unwrap().reason(),
            Some("A maximum of 2 can be bought")
        );
    }

    #[test]
    fn delegate_without_record_is_not_available() {
        let product = test_product(true);
        let policy = DelegateToStockRecord::new(&product, None);

        assert!(!policy.is_available_to_buy());
        assert_eq!(policy.code(), AvailabilityCode::Unavailable);
        assert_eq!(policy.message(), "");
        assert_eq!(policy.lead_time(), None);
        assert_eq!(policy.dispatch_date(), None);

        let err = policy.is_purchase_permitted(1).unwrap_err();
        match err {
            DomainError::MissingCollaborator(_) => {}
            other => panic!("Expected MissingCollaborator error, got {other:?}"),
        }
    }

    #[test]
    fn delegate_ignores_stock_for_untracked_classes() {
        let product = test_product(false);
        let record = test_record(0);
        let policy = DelegateToStockRecord::new(&product, Some(&record));
        assert!(policy.is_available_to_buy());
    }

    #[test]
    fn delegate_forwards_to_the_record() {
        let lead = Duration::days(2);
        let product = test_product(true);
        let record = test_record(3).with_lead_time(lead);
        let policy = DelegateToStockRecord::new(&product, Some(&record));

        assert!(policy.is_available_to_buy());
        assert_eq!(policy.code(), AvailabilityCode::InStock);
        assert_eq!(policy.message(), "In stock (3 available)");
        assert_eq!(policy.lead_time(), Some(lead));
        assert_eq!(policy.dispatch_date(), record.dispatch_date());

        let decision = policy.is_purchase_permitted(4).unwrap();
        assert_eq!(decision.reason(), Some("A maximum of 3 can be bought"));
    }

    #[test]
    fn policies_share_a_uniform_interface() {
        let record = test_record(5);
        let policies: Vec<Box<dyn AvailabilityPolicy + '_>> = vec![
            Box::new(Unavailable),
            Box::new(Available),
            Box::new(StockRequired::new(&record)),
        ];
        let verdicts: Vec<bool> = policies.iter().map(|p| p.is_available_to_buy()).collect();
        assert_eq!(verdicts, vec![false, true, true]);
    }

    #[test]
    fn availability_code_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(AvailabilityCode::InStock).unwrap(),
            serde_json::json!("instock")
        );
        assert_eq!(
            serde_json::to_value(AvailabilityCode::OutOfStock).unwrap(),
            serde_json::json!("outofstock")
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: with positive net stock, any quantity up to the net level
        /// is permitted and anything above it is denied naming that level as
        /// the maximum.
        #[test]
        fn stock_required_boundary(stock in 1u32..500, quantity in 1u32..600) {
            let record = test_record(stock);
            let policy = StockRequired::new(&record);
            let decision = policy.is_purchase_permitted(quantity).unwrap();

            if quantity <= stock {
                prop_assert!(decision.is_permitted());
            } else {
                let expected = format!("A maximum of {} can be bought", stock);
                prop_assert_eq!(decision.reason(), Some(expected.as_str()));
            }
        }
    }
}
