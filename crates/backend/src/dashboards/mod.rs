pub mod d400_monotributo;
