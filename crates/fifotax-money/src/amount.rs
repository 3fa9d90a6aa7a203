//! Currency amount type for monetary values with currency information.

use iso_currency::Currency;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A monetary amount paired with the currency it is denominated in.
///
/// Unlike the reference deployment's single fixed domestic currency, this
/// type carries no notion of "home" currency itself — that is a property of
/// the surrounding [`crate::config`]-level domestic currency, compared
/// against explicitly by callers (see `fifotax-core`'s FX application
/// layer). `CurrencyAmount` only pairs an exact decimal with an ISO 4217
/// currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrencyAmount {
    /// The original amount as entered.
    pub amount: Decimal,
    pub currency: Currency,
}

impl CurrencyAmount {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Returns true if this amount is denominated in `domestic`.
    pub fn is_currency(&self, domestic: Currency) -> bool {
        self.currency == domestic
    }

    /// Get the currency's minor units (decimal places for display).
    pub fn minor_units(&self) -> u16 {
        self.currency.exponent().unwrap_or(2)
    }

    pub fn symbol(&self) -> String {
        self.currency.symbol().to_string()
    }

    pub fn code(&self) -> &'static str {
        self.currency.code()
    }
}

// Custom serialization - always serialize as an object for consistency,
// independent of which currency happens to be the domestic one at read time.
impl Serialize for CurrencyAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CurrencyAmount", 2)?;
        state.serialize_field("amount", &self.amount)?;
        state.serialize_field("currency", self.currency.code())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for CurrencyAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            amount: Decimal,
            currency: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        let currency = Currency::from_code(&raw.currency).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid currency code: '{}'", raw.currency))
        })?;

        Ok(CurrencyAmount::new(raw.amount, currency))
    }
}

impl JsonSchema for CurrencyAmount {
    fn schema_name() -> String {
        "CurrencyAmount".to_owned()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        use schemars::schema::{
            InstanceType, Metadata, ObjectValidation, Schema, SchemaObject, SingleOrVec,
        };

        let schema = SchemaObject {
            instance_type: Some(SingleOrVec::Single(Box::new(InstanceType::Object))),
            object: Some(Box::new(ObjectValidation {
                properties: [
                    ("amount".to_string(), generator.subschema_for::<Decimal>()),
                    ("currency".to_string(), generator.subschema_for::<String>()),
                ]
                .into_iter()
                .collect(),
                required: ["amount".to_string(), "currency".to_string()]
                    .into_iter()
                    .collect(),
                ..Default::default()
            })),
            metadata: Some(Box::new(Metadata {
                description: Some(
                    "A monetary amount: an exact decimal paired with an ISO 4217 currency code."
                        .to_owned(),
                ),
                ..Default::default()
            })),
            ..Default::default()
        };

        Schema::Object(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_json() {
        let amount = CurrencyAmount::new(Decimal::new(12345, 2), Currency::USD);
        let json = serde_json::to_string(&amount).unwrap();
        let back: CurrencyAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, back);
    }

    #[test]
    fn rejects_unknown_currency_code() {
        let json = r#"{"amount": "1.00", "currency": "ZZZ"}"#;
        assert!(serde_json::from_str::<CurrencyAmount>(json).is_err());
    }

    #[test]
    fn is_currency_compares_against_domestic() {
        let eur = CurrencyAmount::new(Decimal::new(100, 0), Currency::EUR);
        assert!(eur.is_currency(Currency::EUR));
        assert!(!eur.is_currency(Currency::USD));
    }
}
