pub mod components;
pub mod notice;
pub mod reply;

pub use notice::Notice;
