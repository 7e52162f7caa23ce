// src/erros.rs
use std::fmt;

#[derive(Debug, Clone)]
pub struct ErroLexico {
    pub linha: usize,
    pub lexema: String,
}

impl fmt::Display for ErroLexico {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Caractere inválido na linha {}: {}",
            self.linha, self.lexema
        )
    }
}

#[derive(Debug, Clone)]
pub struct ErroSintaxe {
    pub linha: usize,
    pub mensagem: String,
}

impl fmt::Display for ErroSintaxe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Erro sintático na linha {}: {}", self.linha, self.mensagem)
    }
}

/// Falha do compilador de bytecode. Tudo-ou-nada: qualquer variante aborta
/// a compilação inteira e nenhum chunk parcial é devolvido.
#[derive(Debug, Clone, PartialEq)]
pub enum ErroCompilacao {
    /// Operador aceito pela sintaxe mas sem instrução correspondente.
    OperadorDesconhecido { operador: String, linha: usize },
    /// Distância de salto acima do que cabe em dois bytes.
    SaltoMuitoLongo { distancia: usize },
    LacoMuitoLongo { distancia: usize },
    /// O índice do pool de constantes é um único byte de operando.
    ConstantesDemais { total: usize },
}

impl fmt::Display for ErroCompilacao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErroCompilacao::OperadorDesconhecido { operador, linha } => {
                write!(
                    f,
                    "Operador sem suporte no bytecode: '{}' (linha {})",
                    operador, linha
                )
            }
            ErroCompilacao::SaltoMuitoLongo { distancia } => {
                write!(f, "Salto muito longo para o bytecode: {} bytes", distancia)
            }
            ErroCompilacao::LacoMuitoLongo { distancia } => {
                write!(f, "Laço muito longo para o bytecode: {} bytes", distancia)
            }
            ErroCompilacao::ConstantesDemais { total } => {
                write!(f, "Constantes demais em um único chunk: {}", total)
            }
        }
    }
}

/// Falha em tempo de execução. A linha vem do mapa de linhas do chunk, no
/// byte que estava sendo executado quando a falha aconteceu.
#[derive(Debug, Clone, PartialEq)]
pub struct ErroExecucao {
    pub mensagem: String,
    pub linha: usize,
}

impl fmt::Display for ErroExecucao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [linha {}]", self.mensagem, self.linha)
    }
}

/// Erro agregado da pipeline completa, usado pelos binários.
#[derive(Debug)]
pub enum Erro {
    Lexico(ErroLexico),
    Sintaxe(ErroSintaxe),
    Compilacao(ErroCompilacao),
    Execucao(ErroExecucao),
    Serializacao(bincode::Error),
    Io(std::io::Error),
}

impl fmt::Display for Erro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Erro::Lexico(e) => write!(f, "{}", e),
            Erro::Sintaxe(e) => write!(f, "{}", e),
            Erro::Compilacao(e) => write!(f, "Erro de compilação: {}", e),
            Erro::Execucao(e) => write!(f, "Erro de execução: {}", e),
            Erro::Serializacao(e) => write!(f, "Bytecode inválido ou ilegível: {}", e),
            Erro::Io(e) => write!(f, "Falha de E/S: {}", e),
        }
    }
}

impl std::error::Error for Erro {}

impl From<ErroLexico> for Erro {
    fn from(erro: ErroLexico) -> Self {
        Erro::Lexico(erro)
    }
}

impl From<ErroSintaxe> for Erro {
    fn from(erro: ErroSintaxe) -> Self {
        Erro::Sintaxe(erro)
    }
}

impl From<ErroCompilacao> for Erro {
    fn from(erro: ErroCompilacao) -> Self {
        Erro::Compilacao(erro)
    }
}

impl From<ErroExecucao> for Erro {
    fn from(erro: ErroExecucao) -> Self {
        Erro::Execucao(erro)
    }
}

impl From<bincode::Error> for Erro {
    fn from(erro: bincode::Error) -> Self {
        Erro::Serializacao(erro)
    }
}

impl From<std::io::Error> for Erro {
    fn from(erro: std::io::Error) -> Self {
        Erro::Io(erro)
    }
}
