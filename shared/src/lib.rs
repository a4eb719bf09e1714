#![no_std]

pub mod color;
pub mod layout;
pub mod link;

pub use color::{gamma32, gamma8, pack_rgb, pack_rgbw};
pub use layout::{ChannelLayout, InvalidLayout, Timing};
