//! Menu screens, one module per section of the main menu

pub mod browse;
pub mod compose;
pub mod main_menu;
pub mod manage;
pub mod owner;
pub mod settings;
