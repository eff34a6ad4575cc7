pub mod header;
pub mod help_overlay;
pub mod log_panel;
pub mod player_pane;
pub mod transport;
pub mod url_bar;
