// Handlers HTTP das sessões de colaborador
pub mod chamados;
pub mod health;
pub mod sessao;

pub use chamados::*;
pub use health::*;
pub use sessao::*;
