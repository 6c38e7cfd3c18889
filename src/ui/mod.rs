pub mod dialogs;
pub mod theme;
pub mod timeline;
pub mod toolbar;
