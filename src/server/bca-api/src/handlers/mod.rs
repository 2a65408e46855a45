//! HTTP handlers.

pub mod backchannel;
pub mod frontchannel;
pub mod sys;
