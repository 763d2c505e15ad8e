pub mod http;
pub mod notifier;

pub use http::HttpStudyApi;
pub use notifier::ChannelNotifier;
