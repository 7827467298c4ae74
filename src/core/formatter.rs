use crate::domain::model::{
    DecisionReason, OverclockDecision, PriceBundle, LAPTOP_EXCLUDED_MESSAGE, NO_SERVICE_MESSAGE,
};

pub const HEADER_LINE: &str = "You can overclock:";
pub const PRICE_LINE_PREFIX: &str = "Matching service:";
pub const INSTALLMENTS_SUFFIX: &str = " (installments available)";

pub struct ResponseFormatter<'a> {
    currency: &'a str,
}

impl<'a> ResponseFormatter<'a> {
    pub fn new(currency: &'a str) -> Self {
        Self { currency }
    }

    pub fn format(&self, decision: &OverclockDecision, bundle: Option<&PriceBundle>) -> String {
        if decision.reason == DecisionReason::Laptop {
            return LAPTOP_EXCLUDED_MESSAGE.to_string();
        }

        let bundle = match bundle {
            Some(bundle) if !decision.is_empty() => bundle,
            _ => return NO_SERVICE_MESSAGE.to_string(),
        };

        let mut lines = vec![HEADER_LINE.to_string()];
        lines.extend(
            decision
                .eligible_components
                .iter()
                .map(|component| format!("- {}", component)),
        );
        lines.push(String::new());
        lines.push(self.price_line(bundle));

        lines.join("\n")
    }

    pub fn price_line(&self, bundle: &PriceBundle) -> String {
        let mut line = format!(
            "{} {} for {}{}",
            PRICE_LINE_PREFIX, bundle.bundle_name, bundle.price_amount, self.currency
        );
        if bundle.installments_allowed {
            line.push_str(INSTALLMENTS_SUFFIX);
        }
        line
    }
}
