pub mod fonts;
pub mod panels;
pub mod plot;
pub mod popup;
pub mod table;
