pub mod battery;
pub mod environment;
pub mod wallpaper;
