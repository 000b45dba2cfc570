//! Avisos al cliente (SMS / email)
//!
//! El envío real lo hace una pasarela externa a la que se le hace POST con
//! el mensaje ya armado. Sin pasarela configurada se usa `LogNotifier`.
//! Un fallo de envío nunca hace fallar la escritura que lo disparó.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Customer, Vehicle, WorkOrder, WorkOrderStatus};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Email,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub channel: Channel,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notification gateway rejected the message: HTTP {0}")]
    Rejected(u16),

    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Notificador que sólo deja constancia en el log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        log::info!(
            "📨 [{:?}] {} -> {}",
            notification.channel,
            notification.to,
            notification.body
        );
        Ok(())
    }
}

/// Notificador que entrega los mensajes a una pasarela HTTP
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: String, api_key: Option<String>) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, url, api_key })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let mut request = self.client.post(&self.url).json(notification);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotificationError::Rejected(response.status().as_u16()));
        }

        log::debug!("📨 Aviso entregado a la pasarela ({:?})", notification.channel);
        Ok(())
    }
}

/// Armar el texto del aviso para un cambio de estado.
/// `None` si el estado no genera aviso.
fn status_message(
    shop_name: &str,
    customer: &Customer,
    vehicle_name: &str,
    order: &WorkOrder,
    amount_due: Option<Decimal>,
) -> Option<(String, String)> {
    let greeting = format!("Hi {},", customer.first_name);
    let body = match order.status {
        WorkOrderStatus::Scheduled => format!(
            "{} your {} is scheduled for service on {}.",
            greeting,
            vehicle_name,
            order.date.format("%b %-d, %Y")
        ),
        WorkOrderStatus::WaitingOnParts => format!(
            "{} we are waiting on parts for your {}. We will let you know as soon as they arrive.",
            greeting, vehicle_name
        ),
        WorkOrderStatus::InProgress => format!(
            "{} work on your {} has started.",
            greeting, vehicle_name
        ),
        WorkOrderStatus::Completed => format!(
            "{} your {} is ready for pickup. Total: ${:.2}.",
            greeting, vehicle_name, order.total_actual
        ),
        WorkOrderStatus::Invoiced => format!(
            "{} your invoice for the {} is ready. Amount: ${:.2}.",
            greeting,
            vehicle_name,
            amount_due.unwrap_or(order.total_actual)
        ),
        WorkOrderStatus::Cancelled => format!(
            "{} the work order for your {} has been cancelled.",
            greeting, vehicle_name
        ),
        _ => return None,
    };

    let subject = format!("{}: {} update", shop_name, vehicle_name);
    Some((subject, format!("{} - {}", body, shop_name)))
}

/// Avisos a enviar según la preferencia de comunicación del cliente.
/// `amount_due` es el total facturado (impuestos incluidos) cuando lo hay.
pub fn build_status_notifications(
    shop_name: &str,
    customer: &Customer,
    vehicle: Option<&Vehicle>,
    order: &WorkOrder,
    amount_due: Option<Decimal>,
) -> Vec<Notification> {
    let vehicle_name = vehicle
        .map(Vehicle::display_name)
        .unwrap_or_else(|| "vehicle".to_string());

    let Some((subject, body)) = status_message(shop_name, customer, &vehicle_name, order, amount_due) else {
        return Vec::new();
    };

    let preference = customer.communication_preference;
    let mut notifications = Vec::new();

    if preference.wants_sms() {
        match &customer.phone {
            Some(phone) => notifications.push(Notification {
                channel: Channel::Sms,
                to: phone.clone(),
                subject: None,
                body: body.clone(),
            }),
            None => log::warn!("⚠️ Cliente {} prefiere SMS pero no tiene teléfono", customer.id),
        }
    }

    if preference.wants_email() {
        match &customer.email {
            Some(email) => notifications.push(Notification {
                channel: Channel::Email,
                to: email.clone(),
                subject: Some(subject),
                body,
            }),
            None => log::warn!("⚠️ Cliente {} prefiere email pero no tiene email", customer.id),
        }
    }

    notifications
}

/// Enviar los avisos; los errores se registran y no se propagan.
/// Devuelve cuántos avisos se entregaron.
pub async fn dispatch(notifier: &dyn Notifier, notifications: &[Notification]) -> usize {
    let mut delivered = 0;
    for notification in notifications {
        match notifier.send(notification).await {
            Ok(()) => delivered += 1,
            Err(e) => log::error!(
                "❌ No se pudo enviar aviso {:?} a {}: {}",
                notification.channel,
                notification.to,
                e
            ),
        }
    }
    delivered
}
