use serde::Deserialize;

pub const PAYMENT_UPDATED: &str = "payment.updated";
pub const COMPLETED: &str = "COMPLETED";

/// Square webhook notification body. Only `type` is required; everything
/// below it is optional because Square sends many event shapes to the same
/// endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub object: WebhookObject,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookObject {
    #[serde(default)]
    pub payment: Option<Payment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// What a notification means to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    PaymentCompleted { order_id: String },
    Ignored { reason: &'static str },
}

impl WebhookPayload {
    pub fn event(&self) -> WebhookEvent {
        if self.event_type != PAYMENT_UPDATED {
            return WebhookEvent::Ignored {
                reason: "not a payment update",
            };
        }
        let Some(payment) = &self.data.object.payment else {
            return WebhookEvent::Ignored {
                reason: "no payment object",
            };
        };
        if payment.status.as_deref() != Some(COMPLETED) {
            return WebhookEvent::Ignored {
                reason: "payment not completed",
            };
        }
        match payment.order_id.as_deref() {
            Some(id) if !id.is_empty() => WebhookEvent::PaymentCompleted {
                order_id: id.to_string(),
            },
            _ => WebhookEvent::Ignored {
                reason: "payment has no order id",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> WebhookPayload {
        serde_json::from_str(json).expect("failed to parse payload")
    }

    #[test]
    fn completed_payment_yields_order() {
        let payload = parse(
            r#"{
                "merchant_id": "M1",
                "type": "payment.updated",
                "event_id": "evt-1",
                "created_at": "2025-07-20T18:00:00Z",
                "data": {
                    "type": "payment",
                    "id": "pay-1",
                    "object": {
                        "payment": {
                            "id": "pay-1",
                            "status": "COMPLETED",
                            "order_id": "ord_1",
                            "amount_money": { "amount": 250, "currency": "CAD" }
                        }
                    }
                }
            }"#,
        );
        assert_eq!(payload.event_id.as_deref(), Some("evt-1"));
        assert_eq!(
            payload.event(),
            WebhookEvent::PaymentCompleted {
                order_id: "ord_1".into()
            }
        );
    }

    #[test]
    fn pending_payment_is_ignored() {
        let payload = parse(
            r#"{"type": "payment.updated", "data": {"object": {"payment": {"status": "PENDING", "order_id": "ord_1"}}}}"#,
        );
        assert!(matches!(payload.event(), WebhookEvent::Ignored { .. }));
    }

    #[test]
    fn other_event_types_are_ignored() {
        let payload = parse(
            r#"{"type": "payment.created", "data": {"object": {"payment": {"status": "COMPLETED", "order_id": "ord_1"}}}}"#,
        );
        assert_eq!(
            payload.event(),
            WebhookEvent::Ignored {
                reason: "not a payment update"
            }
        );
    }

    #[test]
    fn empty_order_id_is_ignored() {
        let payload = parse(
            r#"{"type": "payment.updated", "data": {"object": {"payment": {"status": "COMPLETED", "order_id": ""}}}}"#,
        );
        assert_eq!(
            payload.event(),
            WebhookEvent::Ignored {
                reason: "payment has no order id"
            }
        );
    }

    #[test]
    fn missing_data_is_ignored_not_rejected() {
        let payload = parse(r#"{"type": "payment.updated"}"#);
        assert_eq!(
            payload.event(),
            WebhookEvent::Ignored {
                reason: "no payment object"
            }
        );
    }

    #[test]
    fn missing_type_is_rejected() {
        assert!(serde_json::from_str::<WebhookPayload>(r#"{"data": {}}"#).is_err());
    }
}
