//! Services layer for bloodline
//!
//! Business logic between the HTTP routes and the stores or external APIs.
//!
//! ## Services
//!
//! - **RoleTransition**: registration, donator toggle, admin role overwrite
//! - **AdminStats**: live platform counts and payment total
//! - **Mailer**: donation request and contact mail delivery
//! - **Payments**: payment intent creation with the card processor

pub mod admin_stats;
pub mod mailer;
pub mod payments;
pub mod role_transition;

pub use admin_stats::{coerce_amount, compute_admin_stats, AdminStats};
pub use mailer::{HttpMailer, LogMailer, Mailer, OutgoingMail};
pub use payments::{price_to_minor_units, PaymentProcessor, StripeProcessor};
pub use role_transition::{
    register_or_fetch, set_role, toggle_donator_role, NewUser, Registration, RoleChange,
};
