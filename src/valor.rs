use serde::{Deserialize, Serialize};
use std::fmt;

/// Valor dinâmico manipulado pela VM e guardado no pool de constantes.
///
/// A igualdade é estrutural e estrita quanto à variante: `Inteiro(3)` e
/// `Flutuante(3.0)` nunca são iguais.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Valor {
    Nulo,
    Booleano(bool),
    Inteiro(i64),
    Flutuante(f64),
    Texto(String),
}

impl Valor {
    /// Apenas `nulo` e `falso` são falsos; todo o resto (inclusive 0 e a
    /// string vazia) conta como verdadeiro.
    pub fn eh_verdadeiro(&self) -> bool {
        match self {
            Valor::Nulo => false,
            Valor::Booleano(b) => *b,
            _ => true,
        }
    }

    /// Leitura numérica do valor, promovendo inteiro para flutuante.
    pub fn como_f64(&self) -> Option<f64> {
        match self {
            Valor::Inteiro(n) => Some(*n as f64),
            Valor::Flutuante(x) => Some(*x),
            _ => None,
        }
    }

    pub fn eh_numerico(&self) -> bool {
        matches!(self, Valor::Inteiro(_) | Valor::Flutuante(_))
    }
}

// Implementa como um `Valor` deve ser exibido para o usuário (usado no
// `OP_PRINT` e na concatenação de textos).
impl fmt::Display for Valor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Valor::Nulo => write!(f, "nulo"),
            Valor::Booleano(b) => write!(f, "{}", if *b { "verdadeiro" } else { "falso" }),
            Valor::Inteiro(n) => write!(f, "{}", n),
            // O Display de f64 já omite o ".0" de valores inteiros.
            Valor::Flutuante(x) => write!(f, "{}", x),
            Valor::Texto(s) => write!(f, "{}", s),
        }
    }
}
