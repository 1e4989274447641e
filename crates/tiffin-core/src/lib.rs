//! Tiffin Core - Subscription lifecycle business logic
//!
//! The rules governing when a meal subscription can be created,
//! activated, paused, resumed and cancelled, and when an individual
//! delivery can still be modified:
//!
//! - [`cutoff`] holds both lock windows: the per-delivery 20:00
//!   day-before cutoff and the weekly Friday-to-Monday lock.
//! - [`lifecycle`] is the subscription state machine, including
//!   idempotent payment-driven activation.
//! - [`schedule`] generates the one-week delivery batch at activation.
//! - [`gate`] authorizes skip / address change / delivered marking on
//!   single deliveries.
//! - [`webhook`] verifies and parses payment gateway events.
//!
//! # Example
//!
//! ```rust,ignore
//! use tiffin_core::{CoreConfig, SubscriptionService, SystemClock, LogNotifier};
//!
//! let config = CoreConfig::new().with_offset_minutes(330);
//! let service = SubscriptionService::new(
//!     config,
//!     repos.subscriptions,
//!     repos.deliveries,
//!     Arc::new(LogNotifier),
//!     Arc::new(SystemClock),
//! );
//!
//! let sub = service.confirm_payment("order_123", "pay_456").await?;
//! ```

pub mod clock;
pub mod config;
pub mod cutoff;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod notify;
pub mod schedule;
pub mod webhook;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CoreConfig;
pub use cutoff::{CutoffPolicy, LockStatus};
pub use error::CoreError;
pub use gate::DeliveryService;
pub use lifecycle::{NewSubscription, SubscriptionService};
pub use notify::{LogNotifier, Notifier, NotifyError};
pub use schedule::build_week;
pub use webhook::{PaymentEvent, PaymentEventType, WebhookVerifier};
