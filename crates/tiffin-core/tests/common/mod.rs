//! Common test utilities for tiffin-core integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::{
    FailingNotifier, MockDeliveryRepository, MockSubscriptionRepository, RecordingNotifier,
};
