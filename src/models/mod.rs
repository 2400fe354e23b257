pub mod chamado;

pub use chamado::{ChamadoView, FinalizarRequest, LoginRequest, PainelView};
