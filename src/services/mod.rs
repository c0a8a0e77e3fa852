pub mod booking;
pub mod dashboard;
pub mod format;
pub mod lookup;
pub mod sheet;
pub mod whatsapp;
