#![allow(dead_code)]

pub mod fakes;
pub mod media_server;
