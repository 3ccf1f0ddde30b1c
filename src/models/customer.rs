// src/models/customer.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub epf_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Usado tanto na criação quanto na atualização (sobrescreve tudo)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "The e-mail address is invalid."))]
    pub email: Option<String>,
    pub epf_number: Option<String>,
}

impl CustomerPayload {
    /// Campos opcionais vazios viram NULL, senão "" colidiria nos índices UNIQUE.
    pub fn normalized(mut self) -> Self {
        fn blank_to_none(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        self.name = self.name.trim().to_string();
        self.address = blank_to_none(self.address);
        self.phone = blank_to_none(self.phone);
        self.email = blank_to_none(self.email);
        self.epf_number = blank_to_none(self.epf_number);
        self
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub invoice_count: i64,
    pub total_spent: Decimal,
    pub total_paid: Decimal,
    pub outstanding: Decimal,
    pub last_purchase_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_become_null() {
        let payload = CustomerPayload {
            name: "  Cafe Ceylon ".into(),
            address: Some("".into()),
            phone: Some(" 0771234567 ".into()),
            email: Some("   ".into()),
            epf_number: None,
        }
        .normalized();

        assert_eq!(payload.name, "Cafe Ceylon");
        assert_eq!(payload.address, None);
        assert_eq!(payload.phone.as_deref(), Some("0771234567"));
        assert_eq!(payload.email, None);
    }
}
