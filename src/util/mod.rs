pub mod html;
pub mod locale;
pub mod timesince;
pub mod timezone;
