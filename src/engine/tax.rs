//! GST decomposition of gross order amounts.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GstBreakout {
    pub taxable_base: f64,
    pub total_tax: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
}

/// Splits a tax-inclusive amount. Intra-state bookings split the tax into
/// equal CGST and SGST halves; inter-state bookings carry it all as IGST.
pub fn gst_breakout(amount: f64, rate: f64, interstate: bool) -> GstBreakout {
    if amount <= 0.0 || rate <= 0.0 {
        return GstBreakout {
            taxable_base: amount.max(0.0),
            ..GstBreakout::default()
        };
    }

    let taxable_base = amount / (1.0 + rate);
    let total_tax = amount - taxable_base;

    if interstate {
        GstBreakout {
            taxable_base,
            total_tax,
            cgst: 0.0,
            sgst: 0.0,
            igst: total_tax,
        }
    } else {
        GstBreakout {
            taxable_base,
            total_tax,
            cgst: total_tax / 2.0,
            sgst: total_tax / 2.0,
            igst: 0.0,
        }
    }
}
