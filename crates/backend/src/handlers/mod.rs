// Dashboard handlers
pub mod d400_monotributo;
