//! Multi-link MAVLink router: connection adapters, route learning and subscription
//! dispatch, generic over any dialect that implements `mavlink_core::Message`.

pub mod connection;
pub mod connstring;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod route_table;
pub mod router;
pub mod subscription;
pub mod subscription_cache;
pub mod wire;

pub use connstring::Endpoint;
pub use error::{SendError, StartupError};
pub use frame::{Frame, Target};
pub use metrics::Metrics;
pub use router::{Router, RouterHandle};
pub use subscription::{Delivery, SubscriptionQuery};
