use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use hvacdesk_core::{DomainError, DomainResult, Entity, EntityId, TenantId, UserId};
use hvacdesk_inventory::{StockItem, StockItemId};

/// Quote identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub EntityId);

impl QuoteId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for QuoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Quote status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 4] = [
        QuoteStatus::Draft,
        QuoteStatus::Sent,
        QuoteStatus::Approved,
        QuoteStatus::Rejected,
    ];

    /// Approved and rejected quotes are final.
    pub fn is_closed(self) -> bool {
        matches!(self, QuoteStatus::Approved | QuoteStatus::Rejected)
    }

    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        matches!(
            (self, next),
            (Draft, Sent) | (Draft, Approved) | (Draft, Rejected)
                | (Sent, Draft) | (Sent, Approved) | (Sent, Rejected)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
        }
    }
}

/// One priced line of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub description: String,
    /// Catalog item the line was priced from, if any.
    #[serde(default)]
    pub stock_item_id: Option<StockItemId>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl QuoteLine {
    pub fn service(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            stock_item_id: None,
            quantity,
            unit_price,
        }
    }

    /// Price a line from a catalog item at its current sale price.
    pub fn from_stock_item(item: &StockItem, quantity: Decimal) -> Self {
        Self {
            description: item.name().to_string(),
            stock_item_id: Some(item.id_typed()),
            quantity,
            unit_price: item.sale_price(),
        }
    }

    /// Saturates at `Decimal::MAX`; validated lines always fit.
    pub fn total(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::MAX)
    }

    fn checked_total(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }

    fn normalized(self, index: usize) -> DomainResult<Self> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation(format!(
                "line {}: description cannot be empty",
                index + 1
            )));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "line {}: quantity must be positive",
                index + 1
            )));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "line {}: unit price cannot be negative",
                index + 1
            )));
        }
        if self.checked_total().is_none() {
            return Err(DomainError::validation(format!(
                "line {}: total out of range",
                index + 1
            )));
        }
        Ok(Self { description, ..self })
    }
}

fn normalize_lines(lines: Vec<QuoteLine>) -> DomainResult<Vec<QuoteLine>> {
    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| line.normalized(i))
        .collect::<DomainResult<Vec<_>>>()?;
    if checked_sum(&lines).is_none() {
        return Err(DomainError::validation("quote total out of range"));
    }
    Ok(lines)
}

fn checked_sum(lines: &[QuoteLine]) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.checked_total()?))
}

fn normalize_customer(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("customer name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Stored payload of a quote row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteAttributes {
    pub customer_name: String,
    #[serde(default)]
    pub customer_contact: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: QuoteStatus,
    pub lines: Vec<QuoteLine>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    pub created_by: UserId,
}

/// Customer quote. The total is always derived from the lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    id: QuoteId,
    tenant_id: TenantId,
    #[serde(flatten)]
    attributes: QuoteAttributes,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn hydrate(
        id: QuoteId,
        tenant_id: TenantId,
        attributes: QuoteAttributes,
        version: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            attributes,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn id_typed(&self) -> QuoteId {
        self.id
    }

    pub fn customer_name(&self) -> &str {
        &self.attributes.customer_name
    }

    pub fn customer_contact(&self) -> Option<&str> {
        self.attributes.customer_contact.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.attributes.description.as_deref()
    }

    pub fn status(&self) -> QuoteStatus {
        self.attributes.status
    }

    pub fn lines(&self) -> &[QuoteLine] {
        &self.attributes.lines
    }

    pub fn valid_until(&self) -> Option<NaiveDate> {
        self.attributes.valid_until
    }

    pub fn created_by(&self) -> UserId {
        self.attributes.created_by
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sum of the line totals, saturating at `Decimal::MAX`.
    pub fn total(&self) -> Decimal {
        checked_sum(&self.attributes.lines).unwrap_or(Decimal::MAX)
    }

    pub fn ensure_editable(&self) -> DomainResult<()> {
        if self.status().is_closed() {
            return Err(DomainError::validation(format!(
                "quote is {} and can no longer be edited",
                self.status().as_str()
            )));
        }
        Ok(())
    }

    /// Check a status change against the lifecycle.
    pub fn check_transition(&self, next: QuoteStatus) -> DomainResult<()> {
        if !self.status().can_transition_to(next) {
            return Err(DomainError::validation(format!(
                "cannot move quote from {} to {}",
                self.status().as_str(),
                next.as_str()
            )));
        }
        Ok(())
    }
}

impl Entity for Quote {
    type Id = QuoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Input for a new quote; it always starts as a draft.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuoteDraft {
    pub customer_name: String,
    #[serde(default)]
    pub customer_contact: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lines: Vec<QuoteLine>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl QuoteDraft {
    pub fn for_customer(name: impl Into<String>) -> Self {
        Self {
            customer_name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_line(mut self, line: QuoteLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn into_attributes(self, created_by: UserId) -> DomainResult<QuoteAttributes> {
        Ok(QuoteAttributes {
            customer_name: normalize_customer(&self.customer_name)?,
            customer_contact: normalize_text(self.customer_contact),
            description: normalize_text(self.description),
            status: QuoteStatus::Draft,
            lines: normalize_lines(self.lines)?,
            valid_until: self.valid_until,
            created_by,
        })
    }
}

/// Typed partial update; status changes go through the lifecycle instead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_contact: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_until: Option<Option<NaiveDate>>,
    /// Replaces the whole line list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<QuoteLine>>,
}

impl QuotePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn normalized(self) -> DomainResult<Self> {
        Ok(Self {
            customer_name: self
                .customer_name
                .as_deref()
                .map(normalize_customer)
                .transpose()?,
            customer_contact: self.customer_contact.map(normalize_text),
            description: self.description.map(normalize_text),
            valid_until: self.valid_until,
            lines: self.lines.map(normalize_lines).transpose()?,
        })
    }
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hvacdesk_inventory::ItemDraft;
    use proptest::prelude::*;

    fn quote(status: QuoteStatus, lines: Vec<QuoteLine>) -> Quote {
        let mut attrs = QuoteDraft {
            lines,
            ..QuoteDraft::for_customer("Padaria Central")
        }
        .into_attributes(UserId::new())
        .unwrap();
        attrs.status = status;
        let now = Utc::now();
        Quote::hydrate(QuoteId::new(EntityId::new()), TenantId::new(), attrs, 1, now, now)
    }

    #[test]
    fn total_is_sum_of_line_totals() {
        let q = quote(
            QuoteStatus::Draft,
            vec![
                QuoteLine::service("Split install", Decimal::ONE, Decimal::from(450)),
                QuoteLine::service("Copper pipe (m)", Decimal::from(6), Decimal::new(3550, 2)),
            ],
        );
        assert_eq!(q.total(), Decimal::new(66300, 2));
    }

    #[test]
    fn empty_quote_totals_zero() {
        assert_eq!(quote(QuoteStatus::Draft, vec![]).total(), Decimal::ZERO);
    }

    #[test]
    fn draft_requires_customer_and_valid_lines() {
        let err = QuoteDraft::for_customer(" ").into_attributes(UserId::new()).unwrap_err();
        assert_eq!(err, DomainError::validation("customer name cannot be empty"));

        let err = QuoteDraft::for_customer("Ana")
            .with_line(QuoteLine::service("Cleaning", Decimal::ZERO, Decimal::ONE))
            .into_attributes(UserId::new())
            .unwrap_err();
        assert_eq!(err, DomainError::validation("line 1: quantity must be positive"));
    }

    #[test]
    fn line_from_stock_item_uses_sale_price() {
        let attrs = ItemDraft {
            sale_price: Decimal::from(80),
            unit_cost: Decimal::from(50),
            ..ItemDraft::named("Filter X")
        }
        .into_attributes()
        .unwrap();
        let now = Utc::now();
        let item = StockItem::hydrate(
            StockItemId::new(EntityId::new()),
            TenantId::new(),
            attrs,
            1,
            now,
            now,
        );

        let line = QuoteLine::from_stock_item(&item, Decimal::from(2));
        assert_eq!(line.description, "Filter X");
        assert_eq!(line.stock_item_id, Some(item.id_typed()));
        assert_eq!(line.total(), Decimal::from(160));
    }

    #[test]
    fn closed_quotes_are_not_editable_and_terminal() {
        for status in [QuoteStatus::Approved, QuoteStatus::Rejected] {
            let q = quote(status, vec![]);
            assert!(q.ensure_editable().is_err());
            for next in QuoteStatus::ALL {
                assert!(q.check_transition(next).is_err());
            }
        }
    }

    #[test]
    fn draft_and_sent_can_move_forward() {
        let draft = quote(QuoteStatus::Draft, vec![]);
        assert!(draft.check_transition(QuoteStatus::Sent).is_ok());
        assert!(draft.check_transition(QuoteStatus::Draft).is_err());

        let sent = quote(QuoteStatus::Sent, vec![]);
        assert!(sent.check_transition(QuoteStatus::Approved).is_ok());
        assert!(sent.check_transition(QuoteStatus::Draft).is_ok());
    }

    #[test]
    fn patch_null_clears_optional_fields() {
        let patch: QuotePatch =
            serde_json::from_value(serde_json::json!({ "valid_until": null, "status": "approved" }))
                .unwrap();
        assert_eq!(patch.valid_until, Some(None));
        assert_eq!(patch.customer_contact, None);
    }

    #[test]
    fn oversized_line_is_rejected() {
        let huge = Decimal::from(1_000_000_000_000_000i64);
        let err = QuoteDraft::for_customer("Ana")
            .with_line(QuoteLine::service("Cleaning", Decimal::ONE, Decimal::ONE))
            .with_line(QuoteLine::service("Chiller", huge, huge))
            .into_attributes(UserId::new())
            .unwrap_err();
        assert_eq!(err, DomainError::validation("line 2: total out of range"));
    }

    #[test]
    fn lines_whose_sum_overflows_are_rejected() {
        let half = Decimal::MAX / Decimal::TWO + Decimal::ONE;
        let lines = vec![
            QuoteLine::service("Chiller", Decimal::ONE, half),
            QuoteLine::service("Chiller", Decimal::ONE, half),
        ];

        let err = QuoteDraft {
            lines: lines.clone(),
            ..QuoteDraft::for_customer("Ana")
        }
        .into_attributes(UserId::new())
        .unwrap_err();
        assert_eq!(err, DomainError::validation("quote total out of range"));

        let err = QuotePatch {
            lines: Some(lines),
            ..QuotePatch::default()
        }
        .normalized()
        .unwrap_err();
        assert_eq!(err, DomainError::validation("quote total out of range"));
    }

    #[test]
    fn largest_representable_line_is_accepted() {
        let attrs = QuoteDraft::for_customer("Ana")
            .with_line(QuoteLine::service("Chiller", Decimal::ONE, Decimal::MAX))
            .into_attributes(UserId::new())
            .unwrap();
        assert_eq!(attrs.lines[0].total(), Decimal::MAX);
    }

    #[test]
    fn total_of_unvalidated_lines_saturates() {
        let huge = Decimal::from(1_000_000_000_000_000i64);
        let mut q = quote(QuoteStatus::Draft, vec![]);
        q.attributes.lines.push(QuoteLine::service("Chiller", huge, huge));
        assert_eq!(q.total(), Decimal::MAX);
    }

    proptest! {
        #[test]
        fn total_matches_sum_over_lines(
            lines in proptest::collection::vec((1i64..100, 0i64..100_000), 0..20),
        ) {
            let lines: Vec<QuoteLine> = lines
                .into_iter()
                .map(|(q, cents)| QuoteLine::service("item", Decimal::from(q), Decimal::new(cents, 2)))
                .collect();
            let expected: Decimal = lines.iter().map(|l| l.quantity * l.unit_price).sum();
            prop_assert_eq!(quote(QuoteStatus::Draft, lines).total(), expected);
        }
    }
}
