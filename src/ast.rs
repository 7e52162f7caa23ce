use crate::valor::Valor;

/// Operadores binários aceitos pela sintaxe. Nem todos existem como
/// instrução: `%`, `&&` e `||` são rejeitados pelo compilador de bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperadorBinario {
    Soma,
    Subtracao,
    Multiplicacao,
    Divisao,
    Modulo,
    Igual,
    Diferente,
    Maior,
    MaiorIgual,
    Menor,
    MenorIgual,
    E,
    Ou,
}

impl OperadorBinario {
    pub fn simbolo(&self) -> &'static str {
        match self {
            OperadorBinario::Soma => "+",
            OperadorBinario::Subtracao => "-",
            OperadorBinario::Multiplicacao => "*",
            OperadorBinario::Divisao => "/",
            OperadorBinario::Modulo => "%",
            OperadorBinario::Igual => "==",
            OperadorBinario::Diferente => "!=",
            OperadorBinario::Maior => ">",
            OperadorBinario::MaiorIgual => ">=",
            OperadorBinario::Menor => "<",
            OperadorBinario::MenorIgual => "<=",
            OperadorBinario::E => "&&",
            OperadorBinario::Ou => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperadorUnario {
    /// `-x`, negação numérica.
    Negacao,
    /// `!x`, negação lógica sobre a verdade do valor.
    Nao,
}

/// Expressões da árvore sintática. Os nós que citam uma variável carregam a
/// linha de origem para o mapa de linhas do chunk e para mensagens de erro.
#[derive(Debug, Clone, PartialEq)]
pub enum Expressao {
    Literal(Valor),
    Variavel {
        nome: String,
        linha: usize,
    },
    Atribuicao {
        nome: String,
        linha: usize,
        valor: Box<Expressao>,
    },
    Binaria {
        operador: OperadorBinario,
        linha: usize,
        esquerda: Box<Expressao>,
        direita: Box<Expressao>,
    },
    Unaria {
        operador: OperadorUnario,
        linha: usize,
        operando: Box<Expressao>,
    },
    Agrupamento(Box<Expressao>),
    Chamada {
        alvo: Box<Expressao>,
        argumentos: Vec<Expressao>,
        linha: usize,
    },
    /// `++x` / `x++`; o backend de bytecode trata ambos como acesso global.
    Incremento {
        nome: String,
        linha: usize,
        prefixo: bool,
    },
    Decremento {
        nome: String,
        linha: usize,
        prefixo: bool,
    },
}

/// Comandos da árvore sintática.
#[derive(Debug, Clone, PartialEq)]
pub enum Comando {
    DeclaracaoVar {
        nome: String,
        linha: usize,
        inicializador: Option<Expressao>,
    },
    Imprima(Expressao),
    /// `LEIA nome;` — lê do console e grava na variável.
    Leia {
        nome: String,
        linha: usize,
    },
    Se {
        condicao: Expressao,
        entao: Box<Comando>,
        senao: Option<Box<Comando>>,
    },
    Enquanto {
        condicao: Expressao,
        corpo: Box<Comando>,
    },
    Bloco(Vec<Comando>),
    Expressao(Expressao),
    // Aceitos pela sintaxe, sem geração de código no backend de bytecode.
    Funcao {
        nome: String,
        linha: usize,
        parametros: Vec<String>,
        corpo: Vec<Comando>,
    },
    Retorne {
        valor: Option<Expressao>,
        linha: usize,
    },
    Pare {
        linha: usize,
    },
    Escolha {
        alvo: Expressao,
        casos: Vec<CasoEscolha>,
        padrao: Option<Vec<Comando>>,
        linha: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CasoEscolha {
    pub valor: Expressao,
    pub corpo: Vec<Comando>,
}
