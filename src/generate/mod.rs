// vimage/src/generate/mod.rs
//! Images drawn from scratch on a [`DrawingContext`](crate::context::DrawingContext).

mod captcha;
mod table;

pub use captcha::{captcha_png, generate_captcha, generate_captcha_with_rng, CaptchaConfig};
pub use table::{column_table, row_table};
