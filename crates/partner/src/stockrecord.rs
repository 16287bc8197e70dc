use chrono::{Duration, NaiveDate, Utc};
use tracing::debug;

use storefront_core::{DomainError, DomainResult, Entity, PartnerId, ProductId, StockRecordId};

use crate::availability::{AvailabilityCode, PurchaseDecision};

/// A fulfilment partner's stock information for a single product.
///
/// Counts are split into stock on hand (`num_in_stock`) and open order
/// reservations (`num_allocated`); only the difference can be sold. Partners
/// may oversell (allocations can exceed stock on hand), so the net level
/// saturates at zero rather than going negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    id: StockRecordId,
    product_id: ProductId,
    partner_id: PartnerId,
    partner_sku: String,
    num_in_stock: u32,
    num_allocated: u32,
    low_stock_threshold: Option<u32>,
    lead_time: Option<Duration>,
}

impl StockRecord {
    pub fn new(
        id: StockRecordId,
        product_id: ProductId,
        partner_id: PartnerId,
        partner_sku: impl Into<String>,
        num_in_stock: u32,
    ) -> DomainResult<Self> {
        let partner_sku = partner_sku.into();
        if partner_sku.trim().is_empty() {
            return Err(DomainError::validation("partner sku cannot be empty"));
        }
        Ok(Self {
            id,
            product_id,
            partner_id,
            partner_sku,
            num_in_stock,
            num_allocated: 0,
            low_stock_threshold: None,
            lead_time: None,
        })
    }

    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn with_lead_time(mut self, lead_time: Duration) -> Self {
        self.lead_time = Some(lead_time);
        self
    }

    pub fn id_typed(&self) -> StockRecordId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn partner_id(&self) -> PartnerId {
        self.partner_id
    }

    pub fn partner_sku(&self) -> &str {
        &self.partner_sku
    }

    pub fn num_in_stock(&self) -> u32 {
        self.num_in_stock
    }

    pub fn num_allocated(&self) -> u32 {
        self.num_allocated
    }

    /// Stock that can still be sold: stock on hand minus open allocations.
    pub fn net_stock_level(&self) -> u32 {
        self.num_in_stock.saturating_sub(self.num_allocated)
    }

    /// Whether sellable stock has dropped below the partner's reorder threshold.
    pub fn is_below_threshold(&self) -> bool {
        match self.low_stock_threshold {
            Some(threshold) => self.net_stock_level() < threshold,
            None => false,
        }
    }

    /// Reserve stock against a placed order.
    ///
    /// Overselling is permitted; the net stock level simply bottoms out at
    /// zero until the partner restocks.
    pub fn allocate(&mut self, quantity: u32) -> DomainResult<()> {
        ensure_positive(quantity)?;
        self.num_allocated = self
            .num_allocated
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("allocation count overflow"))?;
        Ok(())
    }

    /// Release a reservation without shipping it (order cancelled or amended).
    pub fn cancel_allocation(&mut self, quantity: u32) -> DomainResult<()> {
        ensure_positive(quantity)?;
        if quantity > self.num_allocated {
            return Err(DomainError::invariant(
                "cannot cancel more than is allocated",
            ));
        }
        self.num_allocated -= quantity;
        Ok(())
    }

    /// Ship a reservation: the allocation and the stock on hand both shrink.
    pub fn consume_allocation(&mut self, quantity: u32) -> DomainResult<()> {
        ensure_positive(quantity)?;
        if quantity > self.num_allocated {
            return Err(DomainError::invariant(
                "cannot consume more than is allocated",
            ));
        }
        self.num_allocated -= quantity;
        self.num_in_stock = self.num_in_stock.saturating_sub(quantity);
        Ok(())
    }

    /// Test whether a proposed purchase is allowed against the net stock level.
    pub fn is_purchase_permitted(&self, quantity: u32) -> PurchaseDecision {
        let net = self.net_stock_level();
        let decision = if net == 0 {
            PurchaseDecision::denied("No stock available")
        } else if quantity > net {
            PurchaseDecision::denied(format!("A maximum of {} can be bought", net))
        } else {
            PurchaseDecision::permitted()
        };
        debug!(
            stockrecord = %self.id,
            quantity,
            net_stock = net,
            permitted = decision.is_permitted(),
            "stock record purchase check"
        );
        decision
    }

    pub fn is_available_to_buy(&self) -> bool {
        self.is_purchase_permitted(1).is_permitted()
    }

    pub fn availability_code(&self) -> AvailabilityCode {
        if self.net_stock_level() > 0 {
            AvailabilityCode::InStock
        } else {
            AvailabilityCode::OutOfStock
        }
    }

    pub fn availability(&self) -> String {
        let net = self.net_stock_level();
        if net > 0 {
            format!("In stock ({} available)", net)
        } else {
            "Not available".to_string()
        }
    }

    pub fn lead_time(&self) -> Option<Duration> {
        self.lead_time
    }

    /// Date an order placed now is expected to ship: today plus the partner's
    /// lead time, when one is known.
    pub fn dispatch_date(&self) -> Option<NaiveDate> {
        self.lead_time.map(|lead| (Utc::now() + lead).date_naive())
    }
}

fn ensure_positive(quantity: u32) -> DomainResult<()> {
    if quantity == 0 {
        return Err(DomainError::validation("quantity must be positive"));
    }
    Ok(())
}

impl Entity for StockRecord {
    type Id = StockRecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
