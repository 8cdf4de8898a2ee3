pub mod channel;
pub mod mouse;
pub mod normalize;
pub mod quic;
pub mod throttle;
