//! Export file parsers

pub mod flomo;
pub mod weixin;

pub use flomo::{parse_flomo_html, FlomoNote};
pub use weixin::{parse_weixin_text, WeixinBook, WeixinNote};
