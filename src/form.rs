//! Order-entry fields and the linkage between the two size inputs.
//!
//! The ETH and USD sizes are two views of the same order: editing one
//! recomputes the other from the limit price, and editing the limit price
//! recomputes whichever size was *not* edited last.

use serde::Serialize;

use crate::codec::round;
use crate::models::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    EthSize,
    UsdSize,
    LimitPrice,
}

/// Fee and net amount shown while hovering a side's button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeePreview {
    pub side: Side,
    pub fee: f64,
    pub total: f64,
    /// `"USD"` or `"ETH"`.
    pub unit: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderForm {
    pub eth_size: String,
    pub usd_size: String,
    pub limit_price: String,
    last_edited: Option<InputField>,
}

impl OrderForm {
    /// Store `value` in `field` and return the linked field the edit rewrote.
    pub fn set(&mut self, field: InputField, value: &str) -> Option<(InputField, String)> {
        match field {
            InputField::EthSize => {
                self.eth_size = value.to_string();
                self.last_edited = Some(InputField::EthSize);
                self.link_from_eth(false)
            }
            InputField::UsdSize => {
                self.usd_size = value.to_string();
                self.last_edited = Some(InputField::UsdSize);
                self.link_from_usd(false)
            }
            InputField::LimitPrice => {
                self.limit_price = value.to_string();
                match self.last_edited {
                    Some(InputField::EthSize) => self.link_from_eth(true),
                    Some(InputField::UsdSize) => self.link_from_usd(true),
                    _ => None,
                }
            }
        }
    }

    pub fn last_edited(&self) -> Option<InputField> {
        self.last_edited
    }

    pub fn fee_preview(&self, side: Side) -> Option<FeePreview> {
        if !(number(&self.limit_price) > 0.0 && number(&self.eth_size) > 0.0) {
            return None;
        }
        let preview = match side {
            Side::Buy => {
                let usd = number(&self.usd_size);
                let fee = usd.round() / 1000.0;
                FeePreview { side, fee, total: usd - fee, unit: "USD" }
            }
            Side::Sell => {
                let eth = number(&self.eth_size);
                let fee = eth / 1000.0;
                FeePreview { side, fee, total: eth - fee, unit: "ETH" }
            }
        };
        Some(preview)
    }

    /// A price edit always recomputes, so a blank price zeroes the USD size.
    fn link_from_eth(&mut self, price_edited: bool) -> Option<(InputField, String)> {
        let limit = number(&self.limit_price);
        if limit > 0.0 || price_edited {
            self.usd_size = format_number(round(number(&self.eth_size) * limit, 2));
        } else if number(&self.usd_size) > 0.0 {
            self.usd_size.clear();
        } else {
            return None;
        }
        Some((InputField::UsdSize, self.usd_size.clone()))
    }

    fn link_from_usd(&mut self, price_edited: bool) -> Option<(InputField, String)> {
        let limit = number(&self.limit_price);
        if limit > 0.0 || price_edited {
            self.eth_size = format_number(round(number(&self.usd_size) / limit, 3));
        } else if number(&self.eth_size) > 0.0 {
            self.eth_size.clear();
        } else {
            return None;
        }
        Some((InputField::EthSize, self.eth_size.clone()))
    }
}

/// Lenient numeric read of a field: blank is zero, garbage is NaN.
fn number(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

fn format_number(value: f64) -> String {
    if value.is_finite() { value.to_string() } else { String::new() }
}
